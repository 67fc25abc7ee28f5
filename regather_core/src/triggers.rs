// Copyright 2026 the Regather Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Update triggers.
//!
//! Accessors are per-element functions whose changes cannot be diffed
//! cheaply, so the framework signals them explicitly: an accessor name
//! present in [`UpdateTriggers`] means its declared inputs changed since the
//! last cycle. The [`all`](UpdateTriggers::all) wildcard marks every accessor
//! as changed.

use alloc::collections::BTreeSet;
use alloc::string::String;

/// Name that sets the wildcard when passed through [`FromIterator`].
pub const ALL: &str = "all";

/// The set of accessors whose update triggers fired this cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateTriggers {
    all: bool,
    changed: BTreeSet<String>,
}

impl UpdateTriggers {
    /// No trigger fired.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// The wildcard fired: every accessor is treated as changed.
    #[must_use]
    pub fn all() -> Self {
        Self {
            all: true,
            changed: BTreeSet::new(),
        }
    }

    /// Builder-style: marks `accessor` as changed.
    #[must_use]
    pub fn with_changed(mut self, accessor: impl Into<String>) -> Self {
        self.set(accessor, true);
        self
    }

    /// Sets or clears the flag for one accessor.
    ///
    /// The name [`ALL`] addresses the wildcard.
    pub fn set(&mut self, accessor: impl Into<String>, changed: bool) {
        let accessor = accessor.into();
        if accessor == ALL {
            self.all = changed;
        } else if changed {
            self.changed.insert(accessor);
        } else {
            self.changed.remove(&accessor);
        }
    }

    /// Returns whether the wildcard fired.
    #[must_use]
    pub fn is_all(&self) -> bool {
        self.all
    }

    /// Returns whether `accessor` was explicitly marked as changed.
    ///
    /// This does not consult the wildcard.
    #[must_use]
    pub fn accessor_changed(&self, accessor: &str) -> bool {
        self.changed.contains(accessor)
    }

    /// Iterates over explicitly changed accessor names in sorted order.
    pub fn changed(&self) -> impl Iterator<Item = &str> + '_ {
        self.changed.iter().map(String::as_str)
    }

    /// Returns `true` if neither the wildcard nor any accessor fired.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.all && self.changed.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, bool)> for UpdateTriggers {
    fn from_iter<I: IntoIterator<Item = (K, bool)>>(iter: I) -> Self {
        let mut triggers = Self::none();
        for (name, changed) in iter {
            triggers.set(name, changed);
        }
        triggers
    }
}

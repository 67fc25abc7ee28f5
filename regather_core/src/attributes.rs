// Copyright 2026 the Regather Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attribute change reports and derived-resource invalidation.
//!
//! After the framework's attribute manager recalculates attributes, the
//! tracker turns the set of changed names into an [`AttributeReport`]. The
//! report carries the derived `positions_changed` flag, since position changes
//! usually invalidate spatial indices, and the list of registered derived
//! resources that the change made stale.

use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use crate::dirty;
use crate::error::TrackerError;

/// Name of the position attribute when the framework does not designate one.
pub const DEFAULT_POSITION_ATTRIBUTE: &str = "positions";

/// Attribute changes for one cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributeReport {
    changed: BTreeSet<String>,
    positions_changed: bool,
    stale_resources: Vec<String>,
}

impl AttributeReport {
    /// Builds a report for `changed` attribute names.
    ///
    /// `positions_changed` is set iff `position_attribute` is among them.
    #[must_use]
    pub fn new<I, S>(changed: I, position_attribute: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let changed: BTreeSet<String> = changed.into_iter().map(Into::into).collect();
        let positions_changed = changed.contains(position_attribute);
        Self {
            changed,
            positions_changed,
            stale_resources: Vec::new(),
        }
    }

    pub(crate) fn with_stale_resources(mut self, stale: Vec<String>) -> Self {
        self.stale_resources = stale;
        self
    }

    /// Iterates over the changed attribute names in sorted order.
    pub fn changed(&self) -> impl Iterator<Item = &str> + '_ {
        self.changed.iter().map(String::as_str)
    }

    /// Returns whether `name` changed.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.changed.contains(name)
    }

    /// Returns `true` if any attribute changed.
    #[must_use]
    pub fn attributes_changed(&self) -> bool {
        !self.changed.is_empty()
    }

    /// Returns `true` if the designated position attribute changed.
    #[must_use]
    pub fn positions_changed(&self) -> bool {
        self.positions_changed
    }

    /// Derived resources invalidated by this change, dependencies first.
    #[must_use]
    pub fn stale_resources(&self) -> &[String] {
        &self.stale_resources
    }
}

/// Dependency graph from attributes to the derived resources built on them.
///
/// Nodes are interned to `u32` keys for the dirty tracker. A node is either a
/// plain attribute or a registered resource; only resources are reported by
/// [`invalidate`](Self::invalidate).
#[derive(Debug)]
pub struct ResourceGraph {
    names: Vec<String>,
    is_resource: Vec<bool>,
    /// Outgoing edges, dependent to dependency, mirrored from `dirty`.
    depends_on: Vec<Vec<u32>>,
    index: HashMap<String, u32>,
    dirty: DirtyTracker<u32>,
}

impl Default for ResourceGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            names: Vec::new(),
            is_resource: Vec::new(),
            depends_on: Vec::new(),
            index: HashMap::new(),
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
        }
    }

    /// Registers `resource` as built from each of `depends_on`.
    ///
    /// Dependencies may be attributes or other resources. Registering the
    /// same resource again adds edges. A registration that would close a
    /// cycle is rejected as a whole and leaves the graph untouched.
    pub fn add_resource<I, S>(&mut self, resource: &str, depends_on: I) -> Result<(), TrackerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let depends_on: Vec<S> = depends_on.into_iter().collect();
        for dependency in &depends_on {
            let dependency = dependency.as_ref();
            if self.closes_cycle(resource, dependency) {
                return Err(TrackerError::DependencyCycle {
                    resource: resource.into(),
                    dependency: dependency.into(),
                });
            }
        }

        let r = self.intern(resource);
        self.is_resource[r as usize] = true;
        for dependency in &depends_on {
            let dependency = dependency.as_ref();
            let d = self.intern(dependency);
            if self.dirty.add_dependency(r, d, dirty::DERIVED).is_err() {
                return Err(TrackerError::DependencyCycle {
                    resource: resource.into(),
                    dependency: dependency.into(),
                });
            }
            if !self.depends_on[r as usize].contains(&d) {
                self.depends_on[r as usize].push(d);
            }
        }
        Ok(())
    }

    /// Returns whether an edge `resource -> dependency` would close a cycle,
    /// i.e. whether `dependency` already reaches `resource`.
    fn closes_cycle(&self, resource: &str, dependency: &str) -> bool {
        if resource == dependency {
            return true;
        }
        let (Some(&r), Some(&d)) = (self.index.get(resource), self.index.get(dependency)) else {
            return false;
        };
        let mut seen = alloc::vec![false; self.names.len()];
        let mut stack = alloc::vec![d];
        while let Some(node) = stack.pop() {
            if node == r {
                return true;
            }
            if core::mem::replace(&mut seen[node as usize], true) {
                continue;
            }
            stack.extend(self.depends_on[node as usize].iter().copied());
        }
        false
    }

    /// Returns whether `name` is a registered resource.
    #[must_use]
    pub fn is_resource(&self, name: &str) -> bool {
        self.index
            .get(name)
            .is_some_and(|&idx| self.is_resource[idx as usize])
    }

    /// Number of registered resources.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.is_resource.iter().filter(|&&r| r).count()
    }

    /// Marks every changed attribute and returns the resources that depend on
    /// any of them, directly or transitively, in dependency order.
    pub fn invalidate<'a>(&mut self, changed: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut marked = false;
        for name in changed {
            if let Some(&idx) = self.index.get(name) {
                self.dirty.mark_with(idx, dirty::DERIVED, &EagerPolicy);
                marked = true;
            }
        }
        if !marked {
            return Vec::new();
        }

        let affected: Vec<u32> = self
            .dirty
            .drain(dirty::DERIVED)
            .affected()
            .deterministic()
            .run()
            .collect();
        affected
            .into_iter()
            .filter(|&idx| self.is_resource[idx as usize])
            .map(|idx| self.names[idx as usize].clone())
            .collect()
    }

    fn intern(&mut self, name: &str) -> u32 {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "resource graphs hold far fewer than u32::MAX nodes"
        )]
        let idx = self.names.len() as u32;
        self.names.push(name.into());
        self.is_resource.push(false);
        self.depends_on.push(Vec::new());
        self.index.insert(name.into(), idx);
        idx
    }
}

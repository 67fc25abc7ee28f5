// Copyright 2026 the Regather Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-dimension dirty classification.
//!
//! [`classify`] runs the checks cheapest first and stops at the first hit:
//!
//! 1. The `all` update trigger fired.
//! 2. One of the dimension's declared accessors fired. Trigger names the
//!    dimension does not declare are ignored.
//! 3. With structural detection enabled: the structural-change flag is set,
//!    or any key outside the [`IgnoreSet`] differs between the snapshots.
//! 4. Without it: any declared prop differs between the snapshots.
//!
//! All value comparisons use the shallow-equality rule of
//! [`PropValue::shallow_eq`](crate::snapshot::PropValue::shallow_eq).
//! Accessor triggers are trusted as declared; a missing trigger for a changed
//! accessor is a caller error, not something the classifier can detect.

use crate::dimension::Dimension;
use crate::filter::IgnoreSet;
use crate::snapshot::{PropSnapshot, prop_differs};
use crate::triggers::UpdateTriggers;

/// Everything the framework supplies for one update cycle.
#[derive(Clone, Copy, Debug)]
pub struct PropUpdate<'a> {
    /// Configuration from the previous cycle.
    pub old: &'a PropSnapshot,
    /// Configuration for this cycle.
    pub new: &'a PropSnapshot,
    /// Update triggers that fired since the previous cycle.
    pub triggers: &'a UpdateTriggers,
    /// Whether the set of active extensions changed.
    pub structure_changed: bool,
}

impl<'a> PropUpdate<'a> {
    /// Creates an update with no structural change.
    #[must_use]
    pub fn new(old: &'a PropSnapshot, new: &'a PropSnapshot, triggers: &'a UpdateTriggers) -> Self {
        Self {
            old,
            new,
            triggers,
            structure_changed: false,
        }
    }

    /// Builder-style: sets the structural-change flag.
    #[must_use]
    pub fn with_structure_changed(mut self, changed: bool) -> Self {
        self.structure_changed = changed;
        self
    }
}

/// Classifier options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClassifyOptions {
    /// Compare every non-ignored key and honor the structural-change flag.
    pub detect_structural_change: bool,
}

impl ClassifyOptions {
    /// Options declared by `dimension`.
    #[must_use]
    pub fn for_dimension(dimension: &Dimension) -> Self {
        Self {
            detect_structural_change: dimension.detects_structural_change(),
        }
    }
}

/// Why a dimension was classified as dirty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirtyReason<'a> {
    /// The `all` update trigger fired.
    AllTriggers,
    /// A declared accessor's update trigger fired.
    AccessorTrigger(&'a str),
    /// The set of active extensions changed.
    StructureChanged,
    /// A relevant configuration key differs.
    PropChanged(&'a str),
}

impl DirtyReason<'_> {
    /// A short stable label for diagnostics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::AllTriggers => "all-triggers",
            Self::AccessorTrigger(_) => "accessor-trigger",
            Self::StructureChanged => "structure-changed",
            Self::PropChanged(_) => "prop-changed",
        }
    }

    /// The accessor or key involved, if any.
    #[must_use]
    pub const fn subject(&self) -> Option<&str> {
        match self {
            Self::AccessorTrigger(name) | Self::PropChanged(name) => Some(*name),
            Self::AllTriggers | Self::StructureChanged => None,
        }
    }
}

/// Classifies `dimension` for this update, returning why it is dirty or
/// `None` if it is clean.
#[must_use]
pub fn classify<'a>(
    update: &PropUpdate<'a>,
    ignore: &IgnoreSet,
    dimension: &'a Dimension,
    options: ClassifyOptions,
) -> Option<DirtyReason<'a>> {
    let triggers = update.triggers;
    if triggers.is_all() {
        return Some(DirtyReason::AllTriggers);
    }
    if let Some(accessor) = dimension
        .accessor_names()
        .iter()
        .find(|name| triggers.accessor_changed(name))
    {
        return Some(DirtyReason::AccessorTrigger(accessor.as_str()));
    }

    if options.detect_structural_change {
        if update.structure_changed {
            return Some(DirtyReason::StructureChanged);
        }
        return first_unignored_difference(update.old, update.new, ignore)
            .map(DirtyReason::PropChanged);
    }

    dimension
        .prop_keys()
        .iter()
        .find(|key| prop_differs(update.old.get(key), update.new.get(key)))
        .map(|key| DirtyReason::PropChanged(key.as_str()))
}

/// Returns `true` if `dimension` must be recomputed for this update.
#[inline]
#[must_use]
pub fn is_dirty(
    update: &PropUpdate<'_>,
    ignore: &IgnoreSet,
    dimension: &Dimension,
    options: ClassifyOptions,
) -> bool {
    classify(update, ignore, dimension, options).is_some()
}

/// Shallow key-by-key comparison over the union of both key sets.
fn first_unignored_difference<'a>(
    old: &'a PropSnapshot,
    new: &'a PropSnapshot,
    ignore: &IgnoreSet,
) -> Option<&'a str> {
    let changed_or_added = new
        .iter()
        .filter(|(key, _)| !ignore.contains(key))
        .find(|(key, value)| prop_differs(old.get(key), Some(*value)))
        .map(|(key, _)| key.as_str());
    if changed_or_added.is_some() {
        return changed_or_added;
    }
    old.keys()
        .filter(|key| !ignore.contains(key))
        .find(|key| !new.contains_key(key))
}

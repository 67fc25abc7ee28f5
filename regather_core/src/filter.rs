// Copyright 2026 the Regather Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ignore-set computation and caching.
//!
//! An [`IgnoreSet`] lists the configuration keys that can never affect a
//! dimension's aggregated data: every known key the dimension does not
//! declare, plus the [framework keys](FRAMEWORK_KEYS) that only influence
//! rendering. It turns a deep compare of arbitrary configuration into a
//! shallow check against an allow-list.
//!
//! [`PropFilter`] caches one ignore set per dimension. The cache is
//! structural: it is rebuilt only when the configuration's key set (its
//! [`SchemaShape`]) changes, never on value changes.

use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashSet;

use crate::dimension::Dimension;

/// Framework keys that never influence aggregated data.
///
/// Extension changes reach the classifier through the structural-change flag
/// and accessor changes through update triggers, so their carrier keys are
/// ignored here too.
///
/// The list is not exhaustive. A framework key left out is compared like any
/// other key, which can only cost a recompute. Use
/// [`TrackerConfig::with_framework_keys`](crate::tracker::TrackerConfig::with_framework_keys)
/// to widen it.
pub const FRAMEWORK_KEYS: &[&str] = &[
    "id",
    "visible",
    "opacity",
    "pickable",
    "autoHighlight",
    "highlightColor",
    "highlightedObjectIndex",
    "onHover",
    "onClick",
    "onDragStart",
    "onDrag",
    "onDragEnd",
    "parameters",
    "transitions",
    "updateTriggers",
    "extensions",
];

/// Keys that are irrelevant to one dimension's aggregation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    keys: HashSet<String>,
}

impl IgnoreSet {
    /// Returns whether `key` is ignored.
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Number of ignored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if no key is ignored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterates over the ignored keys in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.keys.iter().map(String::as_str)
    }
}

/// Computes the ignore set for a dimension using [`FRAMEWORK_KEYS`].
#[must_use]
pub fn compute_ignore_set<D, K, S, T>(declared: D, all_known: K) -> IgnoreSet
where
    D: IntoIterator<Item = S>,
    K: IntoIterator<Item = T>,
    S: AsRef<str>,
    T: AsRef<str>,
{
    compute_ignore_set_with(declared, all_known, FRAMEWORK_KEYS)
}

/// Computes the ignore set for a dimension with an explicit framework key
/// list.
///
/// A declared key is never ignored, even when it is also a framework key.
#[must_use]
pub fn compute_ignore_set_with<D, K, S, T>(
    declared: D,
    all_known: K,
    framework_keys: &[impl AsRef<str>],
) -> IgnoreSet
where
    D: IntoIterator<Item = S>,
    K: IntoIterator<Item = T>,
    S: AsRef<str>,
    T: AsRef<str>,
{
    let declared: HashSet<String> = declared
        .into_iter()
        .map(|k| String::from(k.as_ref()))
        .collect();

    let mut keys = HashSet::new();
    let candidates = all_known
        .into_iter()
        .map(|k| String::from(k.as_ref()))
        .chain(framework_keys.iter().map(|k| String::from(k.as_ref())));
    for key in candidates {
        if !declared.contains(&key) {
            keys.insert(key);
        }
    }
    IgnoreSet { keys }
}

/// The key set of a configuration schema.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SchemaShape {
    keys: BTreeSet<String>,
}

impl SchemaShape {
    /// Iterates over the keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.keys.iter().map(String::as_str)
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if the schema has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for SchemaShape {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().map(|k| String::from(k.as_ref())).collect(),
        }
    }
}

/// Per-dimension ignore-set cache keyed on the schema shape.
#[derive(Clone, Debug)]
pub struct PropFilter {
    framework_keys: Vec<String>,
    shape: Option<SchemaShape>,
    ignore: Vec<IgnoreSet>,
}

impl Default for PropFilter {
    fn default() -> Self {
        Self::new(FRAMEWORK_KEYS)
    }
}

impl PropFilter {
    /// Creates an empty cache that merges `framework_keys` into every set.
    #[must_use]
    pub fn new(framework_keys: &[impl AsRef<str>]) -> Self {
        Self {
            framework_keys: framework_keys
                .iter()
                .map(|k| String::from(k.as_ref()))
                .collect(),
            shape: None,
            ignore: Vec::new(),
        }
    }

    /// Rebuilds the ignore sets if `shape` differs from the cached shape or
    /// the dimension count changed.
    ///
    /// Returns `true` if the sets were rebuilt.
    pub fn refresh(&mut self, dimensions: &[Dimension], shape: SchemaShape) -> bool {
        if self.shape.as_ref() == Some(&shape) && self.ignore.len() == dimensions.len() {
            return false;
        }
        self.ignore = dimensions
            .iter()
            .map(|dim| compute_ignore_set_with(dim.prop_keys(), shape.keys(), &self.framework_keys))
            .collect();
        self.shape = Some(shape);
        true
    }

    /// Returns the cached ignore set for the dimension at `index`.
    #[must_use]
    pub fn ignore_set(&self, index: usize) -> Option<&IgnoreSet> {
        self.ignore.get(index)
    }

    /// All cached ignore sets, in dimension order.
    #[must_use]
    pub fn ignore_sets(&self) -> &[IgnoreSet] {
        &self.ignore
    }

    /// Returns the shape the cache was last built for.
    #[must_use]
    pub fn shape(&self) -> Option<&SchemaShape> {
        self.shape.as_ref()
    }

    /// Drops every cached set.
    pub fn clear(&mut self) {
        self.shape = None;
        self.ignore.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn ignores_undeclared_keys() {
        let set = compute_ignore_set(["cellSize"], ["cellSize", "colorRange", "data"]);
        assert!(!set.contains("cellSize"));
        assert!(set.contains("colorRange"));
        assert!(set.contains("data"));
    }

    #[test]
    fn always_includes_framework_keys() {
        let set = compute_ignore_set(["cellSize"], ["cellSize"]);
        for key in FRAMEWORK_KEYS {
            assert!(set.contains(key), "{key} should be ignored");
        }
        assert_eq!(set.len(), FRAMEWORK_KEYS.len());
    }

    #[test]
    fn declared_framework_key_is_not_ignored() {
        let set = compute_ignore_set(["opacity"], ["opacity", "radius"]);
        assert!(!set.contains("opacity"));
        assert!(set.contains("radius"));
    }

    #[test]
    fn result_is_independent_of_input_order() {
        let a = compute_ignore_set(["b", "a"], ["c", "a", "b", "d"]);
        let b = compute_ignore_set(["a", "b"], ["d", "b", "c", "a"]);
        assert_eq!(a, b);
    }

    #[test]
    fn custom_framework_keys() {
        let set = compute_ignore_set_with(["x"], ["x", "y"], &["id"]);
        assert_eq!(set.len(), 2);
        assert!(set.contains("id"));
        assert!(set.contains("y"));
    }

    #[test]
    fn filter_rebuilds_only_on_shape_change() {
        let dims = vec![Dimension::new("bin").props(["cellSize"])];
        let mut filter = PropFilter::default();

        assert!(filter.refresh(&dims, ["cellSize", "color"].into_iter().collect()));
        assert!(!filter.refresh(&dims, ["color", "cellSize"].into_iter().collect()));
        assert!(filter.refresh(&dims, ["cellSize", "color", "radius"].into_iter().collect()));

        let set = filter.ignore_set(0).unwrap();
        assert!(set.contains("radius"));
        assert!(!set.contains("cellSize"));
        assert_eq!(filter.shape().map(SchemaShape::len), Some(3));
    }

    #[test]
    fn clear_forces_rebuild() {
        let dims = vec![Dimension::new("bin")];
        let mut filter = PropFilter::default();
        let shape: SchemaShape = ["a"].into_iter().collect();
        assert!(filter.refresh(&dims, shape.clone()));
        filter.clear();
        assert!(filter.ignore_set(0).is_none());
        assert!(filter.refresh(&dims, shape));
    }
}

// Copyright 2026 the Regather Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Configuration snapshots and the shallow-equality rule.
//!
//! A [`PropSnapshot`] is the full set of externally supplied parameters for
//! one update cycle. Two snapshots (previous and current) are compared per
//! update, key by key, using [`PropValue::shallow_eq`]:
//!
//! - [`Null`](PropValue::Null), [`Bool`](PropValue::Bool),
//!   [`Number`](PropValue::Number) and [`Text`](PropValue::Text) compare by
//!   value. Numbers use IEEE equality, so `NaN` never equals itself.
//! - [`Shared`](PropValue::Shared) values (data arrays, objects, accessor
//!   closures) compare by reference identity only. Mutating shared data in
//!   place and passing the same reference again is *not* detected; callers
//!   signal genuine data changes by passing a new reference.
//!
//! A key missing from a snapshot reads as "undefined": absent on one side and
//! present on the other is a difference, absent on both sides is not.

use alloc::collections::BTreeMap;
use alloc::collections::btree_map;
use alloc::string::String;
use alloc::sync::Arc;
use core::any::Any;
use core::fmt;

/// A reference-identity handle to shared, opaque data.
///
/// Two handles are equal only if they point at the same allocation.
#[derive(Clone)]
pub struct SharedRef(Arc<dyn Any + Send + Sync>);

impl SharedRef {
    /// Wraps a value in a new shared allocation.
    #[must_use]
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Wraps an existing allocation without copying it.
    #[must_use]
    pub fn from_arc(value: Arc<dyn Any + Send + Sync>) -> Self {
        Self(value)
    }

    /// Returns `true` if both handles refer to the same allocation.
    #[inline]
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        core::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }

    /// Attempts to view the shared data as a `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for SharedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedRef({:p})", Arc::as_ptr(&self.0))
    }
}

/// A single configuration value.
#[derive(Clone, Debug)]
pub enum PropValue {
    /// An explicit null.
    Null,
    /// A boolean flag.
    Bool(bool),
    /// A number.
    Number(f64),
    /// A string, compared by value.
    Text(Arc<str>),
    /// Opaque data compared by reference identity.
    Shared(SharedRef),
}

impl PropValue {
    /// Wraps a value as [`PropValue::Shared`] in a fresh allocation.
    #[must_use]
    pub fn shared<T: Any + Send + Sync>(value: T) -> Self {
        Self::Shared(SharedRef::new(value))
    }

    /// Shallow equality: value equality for scalars and text, reference
    /// identity for shared data.
    #[must_use]
    pub fn shallow_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Shared(a), Self::Shared(b)) => a.same(b),
            _ => false,
        }
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<f32> for PropValue {
    fn from(value: f32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for PropValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Text(Arc::from(value))
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Text(Arc::from(value))
    }
}

impl From<SharedRef> for PropValue {
    fn from(value: SharedRef) -> Self {
        Self::Shared(value)
    }
}

/// Returns `true` if two optional values differ under the shallow-equality
/// rule. A missing value only equals another missing value.
#[inline]
#[must_use]
pub fn prop_differs(old: Option<&PropValue>, new: Option<&PropValue>) -> bool {
    match (old, new) {
        (None, None) => false,
        (Some(a), Some(b)) => !a.shallow_eq(b),
        _ => true,
    }
}

/// An immutable-per-cycle mapping from configuration key to value.
///
/// Keys are kept in sorted order so iteration (and therefore every diff
/// derived from it) is deterministic.
#[derive(Clone, Debug, Default)]
pub struct PropSnapshot {
    values: BTreeMap<String, PropValue>,
}

impl PropSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts or replaces a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Returns the value for `key`, or `None` if it is undefined.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.values.get(key)
    }

    /// Returns whether `key` is defined.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterates over the defined keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.keys().map(String::as_str)
    }

    /// Iterates over `(key, value)` pairs in sorted key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, PropValue> {
        self.values.iter()
    }

    /// Number of defined keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no key is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<PropValue>> FromIterator<(K, V)> for PropSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

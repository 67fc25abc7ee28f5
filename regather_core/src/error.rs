// Copyright 2026 the Regather Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracker errors.
//!
//! Every variant is a contract violation by the caller. None of them is
//! retried or mapped to a "clean" decision.

use alloc::string::String;
use core::fmt;

/// Errors from [`AggregationTracker`](crate::tracker::AggregationTracker)
/// operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrackerError {
    /// An update was requested before [`initialize`].
    ///
    /// [`initialize`]: crate::tracker::AggregationTracker::initialize
    NotInitialized,
    /// [`initialize`] was called on a tracker that is already ready.
    ///
    /// [`initialize`]: crate::tracker::AggregationTracker::initialize
    AlreadyInitialized,
    /// The attribute report was requested before the first attribute update.
    NotYetComputed,
    /// A decision was requested for a dimension that was never registered.
    UnknownDimension(String),
    /// Two dimensions were registered under the same name.
    DuplicateDimension(String),
    /// Registering a derived resource would create a dependency cycle.
    DependencyCycle {
        /// The resource being registered.
        resource: String,
        /// The dependency that closes the cycle.
        dependency: String,
    },
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "aggregation tracker is not initialized"),
            Self::AlreadyInitialized => write!(f, "aggregation tracker is already initialized"),
            Self::NotYetComputed => write!(f, "no attribute report has been computed yet"),
            Self::UnknownDimension(name) => write!(f, "unknown dimension `{name}`"),
            Self::DuplicateDimension(name) => write!(f, "dimension `{name}` registered twice"),
            Self::DependencyCycle {
                resource,
                dependency,
            } => write!(
                f,
                "resource `{resource}` cannot depend on `{dependency}`: dependency cycle"
            ),
        }
    }
}

impl core::error::Error for TrackerError {}

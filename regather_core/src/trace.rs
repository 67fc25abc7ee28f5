// Copyright 2026 the Regather Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the update cycle.
//!
//! This module provides a [`TraceSink`] trait with one method per event the
//! tracker emits. All method bodies default to no-ops, so implementing only
//! the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use crate::classify::DirtyReason;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a configuration cycle starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleBeginEvent {
    /// Monotonic configuration-cycle counter.
    pub cycle: u64,
    /// Number of registered dimensions.
    pub dimension_count: u32,
    /// Whether the set of active extensions changed.
    pub structure_changed: bool,
    /// Whether the `all` update trigger fired.
    pub all_triggers: bool,
}

/// Emitted once per dimension with its decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerdictEvent<'a> {
    /// Cycle counter.
    pub cycle: u64,
    /// Registration index of the dimension.
    pub dimension: u32,
    /// Dimension name.
    pub name: &'a str,
    /// Why the dimension is dirty, or `None` if it is clean.
    pub reason: Option<DirtyReason<'a>>,
}

/// Emitted at the end of a configuration cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleSummary {
    /// Cycle counter.
    pub cycle: u64,
    /// Dimensions that need recomputation.
    pub dirty: u32,
    /// Dimensions that can be reused.
    pub clean: u32,
}

/// Emitted when the ignore sets were rebuilt for a new schema shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IgnoreSetsRebuiltEvent {
    /// Number of keys in the new shape.
    pub shape_keys: u32,
    /// Number of ignore sets rebuilt.
    pub dimensions: u32,
}

/// Emitted after an attribute report was computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttributesEvent {
    /// Configuration cycle the report belongs to.
    pub cycle: u64,
    /// Number of changed attributes.
    pub changed: u32,
    /// Whether the position attribute changed.
    pub positions_changed: bool,
    /// Number of derived resources made stale.
    pub stale_resources: u32,
}

/// Emitted for each model rebuild requested after a structural change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelUpdateEvent<'a> {
    /// Owning dimension.
    pub dimension: &'a str,
    /// Model to rebuild.
    pub model: &'a str,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the tracker.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a configuration cycle starts.
    fn on_cycle_begin(&mut self, e: &CycleBeginEvent) {
        _ = e;
    }

    /// Called with each dimension's decision.
    fn on_verdict(&mut self, e: &VerdictEvent<'_>) {
        _ = e;
    }

    /// Called when a configuration cycle ends.
    fn on_cycle_summary(&mut self, s: &CycleSummary) {
        _ = s;
    }

    /// Called when ignore sets were rebuilt.
    fn on_ignore_sets_rebuilt(&mut self, e: &IgnoreSetsRebuiltEvent) {
        _ = e;
    }

    /// Called after an attribute report was computed.
    fn on_attributes(&mut self, e: &AttributesEvent) {
        _ = e;
    }

    /// Called for each requested model rebuild.
    fn on_model_update(&mut self, e: &ModelUpdateEvent<'_>) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`CycleBeginEvent`].
    #[inline]
    pub fn cycle_begin(&mut self, e: &CycleBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_cycle_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`VerdictEvent`].
    #[inline]
    pub fn verdict(&mut self, e: &VerdictEvent<'_>) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_verdict(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CycleSummary`].
    #[inline]
    pub fn cycle_summary(&mut self, s: &CycleSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_cycle_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits an [`IgnoreSetsRebuiltEvent`].
    #[inline]
    pub fn ignore_sets_rebuilt(&mut self, e: &IgnoreSetsRebuiltEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_ignore_sets_rebuilt(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`AttributesEvent`].
    #[inline]
    pub fn attributes(&mut self, e: &AttributesEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_attributes(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ModelUpdateEvent`].
    #[inline]
    pub fn model_update(&mut self, e: &ModelUpdateEvent<'_>) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_model_update(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

// Copyright 2026 the Regather Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change detection for aggregating visualization layers.
//!
//! `regather_core` decides, on every update cycle, whether an expensive
//! derived dataset (an "aggregation") must be recomputed, and which derived
//! GPU resources went stale because their attributes changed. It is `no_std`
//! compatible (with `alloc`). The aggregation itself, shader compilation and
//! buffer layout stay with the rendering framework.
//!
//! # Architecture
//!
//! ```text
//!   schema keys ──► PropFilter (cached per shape) ──► IgnoreSet per dimension
//!                                                          │
//!   PropUpdate { old, new, triggers, structure } ──────────┤
//!                                                          ▼
//!                          classify() per dimension ──► DirtyDecisions
//!
//!   changed attribute names ──► ResourceGraph ──► AttributeReport
//! ```
//!
//! **[`snapshot`]**: Configuration snapshots and the shallow-equality rule
//! used to compare them.
//!
//! **[`triggers`]**: Update triggers, including the `all` wildcard.
//!
//! **[`dimension`]**: Dimension descriptors and the closed
//! [`AggregationKind`](dimension::AggregationKind) set with its shader hook.
//!
//! **[`filter`]**: Ignore-set computation and the shape-keyed
//! [`PropFilter`](filter::PropFilter) cache.
//!
//! **[`classify`]**: The per-dimension dirty check.
//!
//! **[`attributes`]**: Attribute reports and derived-resource invalidation
//! via `understory_dirty`.
//!
//! **[`tracker`]**: [`AggregationTracker`](tracker::AggregationTracker), which
//! ties the above into one update cycle.
//!
//! **[`settings`]**: Per-frame parameters handed to the aggregation.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! cycle instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod attributes;
pub mod classify;
pub mod dimension;
pub mod dirty;
pub mod error;
pub mod filter;
pub mod settings;
pub mod snapshot;
pub mod trace;
pub mod tracker;
pub mod triggers;

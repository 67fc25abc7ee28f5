// Copyright 2026 the Regather Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Derived GPU resources (spatial indices, aggregation buffers) are tracked
//! with [`understory_dirty`]. Each resource has dependency edges to the
//! attributes and resources it is built from, so marking a changed attribute
//! with [`EagerPolicy`](understory_dirty::EagerPolicy) reaches every resource
//! that has to be rebuilt.
//!
//! # Consumption
//!
//! Callers never query dirty state directly.
//! [`AggregationTracker::on_attributes_changed`](crate::tracker::AggregationTracker::on_attributes_changed)
//! marks and drains the channel in one step and surfaces the result as
//! [`AttributeReport::stale_resources`](crate::attributes::AttributeReport::stale_resources).

use understory_dirty::Channel;

/// A derived resource is out of date with the attributes it is built from.
pub const DERIVED: Channel = Channel::new(0);

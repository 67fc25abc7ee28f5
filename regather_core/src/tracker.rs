// Copyright 2026 the Regather Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-layer aggregation tracker.
//!
//! [`AggregationTracker`] owns the registered [`Dimension`]s, their cached
//! ignore sets, the derived-resource graph and the live attribute report. It
//! drives one update cycle at a time:
//!
//! ```text
//!   initialize(dimensions, keys)      once
//!        │
//!        ▼
//!   on_configuration_changed(update)  ──► DirtyDecisions
//!   on_structure_changed(shaders)     ──► Vec<ModelUpdate>
//!   on_attributes_changed(names, pos) ──► &AttributeReport
//!        │
//!        ▼
//!   teardown()
//! ```
//!
//! Decisions are pure functions of the update and the cached ignore sets, so
//! repeating a cycle with the same inputs yields the same decisions.

use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;

use crate::attributes::{AttributeReport, ResourceGraph};
use crate::classify::{ClassifyOptions, PropUpdate, classify};
use crate::dimension::{Dimension, ModelUpdate, NON_INSTANCED_MODEL, ShaderConfig};
use crate::error::TrackerError;
use crate::filter::{FRAMEWORK_KEYS, IgnoreSet, PropFilter, SchemaShape};
use crate::trace::{
    AttributesEvent, CycleBeginEvent, CycleSummary, IgnoreSetsRebuiltEvent, ModelUpdateEvent,
    Tracer, VerdictEvent,
};

/// Configuration for the [`AggregationTracker`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Keys merged into every ignore set regardless of the schema.
    pub framework_keys: Vec<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::with_framework_keys(FRAMEWORK_KEYS)
    }
}

impl TrackerConfig {
    /// Uses `keys` as the framework key list.
    #[must_use]
    pub fn with_framework_keys(keys: &[impl AsRef<str>]) -> Self {
        Self {
            framework_keys: keys.iter().map(|k| String::from(k.as_ref())).collect(),
        }
    }

    /// Ignores only the keys the schema declares and a dimension does not.
    ///
    /// Useful for hosts that route every key through the schema.
    #[must_use]
    pub fn schema_only() -> Self {
        Self {
            framework_keys: Vec::new(),
        }
    }
}

/// Lifecycle state of a tracker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrackerState {
    /// No dimensions registered yet.
    #[default]
    Uninitialized,
    /// Dimensions registered and ignore sets cached.
    Ready,
}

/// One dimension's decision for a cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DimensionVerdict {
    /// Dimension name.
    pub name: String,
    /// Whether the dimension must be recomputed.
    pub dirty: bool,
}

/// Per-dimension decisions for one cycle, in registration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirtyDecisions {
    verdicts: Vec<DimensionVerdict>,
}

impl DirtyDecisions {
    /// Returns the decision for `name`.
    pub fn is_dirty(&self, name: &str) -> Result<bool, TrackerError> {
        self.verdicts
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.dirty)
            .ok_or_else(|| TrackerError::UnknownDimension(name.into()))
    }

    /// Returns `true` if at least one dimension is dirty.
    #[must_use]
    pub fn any_dirty(&self) -> bool {
        self.verdicts.iter().any(|v| v.dirty)
    }

    /// Names of the dirty dimensions, in registration order.
    pub fn dirty_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.verdicts
            .iter()
            .filter(|v| v.dirty)
            .map(|v| v.name.as_str())
    }

    /// Iterates over all verdicts.
    pub fn iter(&self) -> core::slice::Iter<'_, DimensionVerdict> {
        self.verdicts.iter()
    }

    /// Number of verdicts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.verdicts.len()
    }

    /// Returns `true` if no dimension is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }
}

impl<'a> IntoIterator for &'a DirtyDecisions {
    type Item = &'a DimensionVerdict;
    type IntoIter = core::slice::Iter<'a, DimensionVerdict>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Change tracking for one aggregating layer.
#[derive(Debug)]
pub struct AggregationTracker {
    config: TrackerConfig,
    state: TrackerState,
    dimensions: Vec<Dimension>,
    filter: PropFilter,
    resources: ResourceGraph,
    report: Option<AttributeReport>,
    cycle: u64,
}

impl Default for AggregationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregationTracker {
    /// Creates an uninitialized tracker with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TrackerConfig::default())
    }

    /// Creates an uninitialized tracker with `config`.
    #[must_use]
    pub fn with_config(config: TrackerConfig) -> Self {
        let filter = PropFilter::new(&config.framework_keys);
        Self {
            config,
            state: TrackerState::Uninitialized,
            dimensions: Vec::new(),
            filter,
            resources: ResourceGraph::new(),
            report: None,
            cycle: 0,
        }
    }

    /// Registers `dimensions` and caches their ignore sets against
    /// `all_known_keys`.
    pub fn initialize<D, K, S>(
        &mut self,
        dimensions: D,
        all_known_keys: K,
    ) -> Result<(), TrackerError>
    where
        D: IntoIterator<Item = Dimension>,
        K: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.state == TrackerState::Ready {
            return Err(TrackerError::AlreadyInitialized);
        }
        let dimensions: Vec<Dimension> = dimensions.into_iter().collect();
        let mut seen = BTreeSet::new();
        for dim in &dimensions {
            if !seen.insert(dim.name()) {
                return Err(TrackerError::DuplicateDimension(dim.name().into()));
            }
        }

        self.filter
            .refresh(&dimensions, all_known_keys.into_iter().collect());
        self.dimensions = dimensions;
        self.state = TrackerState::Ready;
        Ok(())
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> TrackerState {
        self.state
    }

    /// Returns `true` once [`initialize`](Self::initialize) succeeded.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == TrackerState::Ready
    }

    /// Number of completed configuration cycles.
    #[must_use]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Registered dimensions in registration order.
    #[must_use]
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Looks up a registered dimension.
    pub fn dimension(&self, name: &str) -> Result<&Dimension, TrackerError> {
        self.index_of(name).map(|idx| &self.dimensions[idx])
    }

    /// Returns the cached ignore set of a registered dimension.
    pub fn ignore_set(&self, name: &str) -> Result<&IgnoreSet, TrackerError> {
        self.ensure_ready()?;
        let idx = self.index_of(name)?;
        self.filter
            .ignore_set(idx)
            .ok_or(TrackerError::NotInitialized)
    }

    /// Feeds a new configuration key set.
    ///
    /// Returns `true` if the ignore sets were rebuilt, which happens only when
    /// the key set differs from the cached one.
    pub fn reshape<K, S>(&mut self, all_known_keys: K) -> Result<bool, TrackerError>
    where
        K: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.reshape_traced(all_known_keys, &mut Tracer::none())
    }

    /// [`reshape`](Self::reshape) with tracing.
    pub fn reshape_traced<K, S>(
        &mut self,
        all_known_keys: K,
        tracer: &mut Tracer<'_>,
    ) -> Result<bool, TrackerError>
    where
        K: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ensure_ready()?;
        let shape: SchemaShape = all_known_keys.into_iter().collect();
        let shape_keys = saturating_u32(shape.len());
        let rebuilt = self.filter.refresh(&self.dimensions, shape);
        if rebuilt {
            tracer.ignore_sets_rebuilt(&IgnoreSetsRebuiltEvent {
                shape_keys,
                dimensions: saturating_u32(self.dimensions.len()),
            });
        }
        Ok(rebuilt)
    }

    /// Classifies every registered dimension for `update`.
    pub fn on_configuration_changed(
        &mut self,
        update: &PropUpdate<'_>,
    ) -> Result<DirtyDecisions, TrackerError> {
        self.on_configuration_changed_traced(update, &mut Tracer::none())
    }

    /// [`on_configuration_changed`](Self::on_configuration_changed) with
    /// tracing.
    pub fn on_configuration_changed_traced(
        &mut self,
        update: &PropUpdate<'_>,
        tracer: &mut Tracer<'_>,
    ) -> Result<DirtyDecisions, TrackerError> {
        self.ensure_ready()?;
        self.cycle += 1;
        let cycle = self.cycle;

        tracer.cycle_begin(&CycleBeginEvent {
            cycle,
            dimension_count: saturating_u32(self.dimensions.len()),
            structure_changed: update.structure_changed,
            all_triggers: update.triggers.is_all(),
        });

        let mut verdicts = Vec::with_capacity(self.dimensions.len());
        let mut dirty = 0_u32;
        for (idx, (dim, ignore)) in self
            .dimensions
            .iter()
            .zip(self.filter.ignore_sets())
            .enumerate()
        {
            let reason = classify(update, ignore, dim, ClassifyOptions::for_dimension(dim));
            tracer.verdict(&VerdictEvent {
                cycle,
                dimension: saturating_u32(idx),
                name: dim.name(),
                reason,
            });
            if reason.is_some() {
                dirty += 1;
            }
            verdicts.push(DimensionVerdict {
                name: dim.name().into(),
                dirty: reason.is_some(),
            });
        }

        tracer.cycle_summary(&CycleSummary {
            cycle,
            dirty,
            clean: saturating_u32(verdicts.len()) - dirty,
        });
        Ok(DirtyDecisions { verdicts })
    }

    /// Classifies a single dimension for `update`.
    pub fn is_dimension_dirty(
        &self,
        name: &str,
        update: &PropUpdate<'_>,
    ) -> Result<bool, TrackerError> {
        let ignore = self.ignore_set(name)?;
        let dim = self.dimension(name)?;
        Ok(classify(update, ignore, dim, ClassifyOptions::for_dimension(dim)).is_some())
    }

    /// Reacts to a change in the set of active extensions.
    ///
    /// Forces [`NON_INSTANCED_MODEL`] to 1 in `shaders` and asks every
    /// dimension's aggregation kind which models must be rebuilt.
    pub fn on_structure_changed(
        &self,
        shaders: ShaderConfig,
    ) -> Result<Vec<ModelUpdate>, TrackerError> {
        self.on_structure_changed_traced(shaders, &mut Tracer::none())
    }

    /// [`on_structure_changed`](Self::on_structure_changed) with tracing.
    pub fn on_structure_changed_traced(
        &self,
        shaders: ShaderConfig,
        tracer: &mut Tracer<'_>,
    ) -> Result<Vec<ModelUpdate>, TrackerError> {
        self.ensure_ready()?;
        let shaders = shaders.with_define(NON_INSTANCED_MODEL, 1);
        let updates: Vec<ModelUpdate> = self
            .dimensions
            .iter()
            .filter_map(|dim| {
                dim.aggregation_kind()
                    .update_derived_resources(dim.name(), &shaders)
            })
            .collect();
        for update in &updates {
            tracer.model_update(&ModelUpdateEvent {
                dimension: &update.dimension,
                model: &update.model,
            });
        }
        Ok(updates)
    }

    /// Declares a derived resource built from `depends_on`.
    ///
    /// Dependencies may name attributes or other registered resources.
    pub fn register_derived_resource<I, S>(
        &mut self,
        name: &str,
        depends_on: I,
    ) -> Result<(), TrackerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.resources.add_resource(name, depends_on)
    }

    /// Records the attributes the framework recalculated this cycle.
    ///
    /// Replaces the previous report. Only one report is live at a time.
    pub fn on_attributes_changed<I, S>(
        &mut self,
        changed: I,
        position_attribute: &str,
    ) -> &AttributeReport
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.on_attributes_changed_traced(changed, position_attribute, &mut Tracer::none())
    }

    /// [`on_attributes_changed`](Self::on_attributes_changed) with tracing.
    pub fn on_attributes_changed_traced<I, S>(
        &mut self,
        changed: I,
        position_attribute: &str,
        tracer: &mut Tracer<'_>,
    ) -> &AttributeReport
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let report = AttributeReport::new(changed, position_attribute);
        let stale = self.resources.invalidate(report.changed());
        let report = report.with_stale_resources(stale);
        tracer.attributes(&AttributesEvent {
            cycle: self.cycle,
            changed: saturating_u32(report.changed().count()),
            positions_changed: report.positions_changed(),
            stale_resources: saturating_u32(report.stale_resources().len()),
        });
        self.report.insert(report)
    }

    /// The last computed attribute report.
    pub fn current_report(&self) -> Result<&AttributeReport, TrackerError> {
        self.report.as_ref().ok_or(TrackerError::NotYetComputed)
    }

    /// Drops all registrations and cached state.
    ///
    /// The configuration is kept; the tracker can be initialized again.
    pub fn teardown(&mut self) {
        let config = core::mem::take(&mut self.config);
        *self = Self::with_config(config);
    }

    fn ensure_ready(&self) -> Result<(), TrackerError> {
        match self.state {
            TrackerState::Ready => Ok(()),
            TrackerState::Uninitialized => Err(TrackerError::NotInitialized),
        }
    }

    fn index_of(&self, name: &str) -> Result<usize, TrackerError> {
        self.ensure_ready()?;
        self.dimensions
            .iter()
            .position(|d| d.name() == name)
            .ok_or_else(|| TrackerError::UnknownDimension(name.into()))
    }
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::DEFAULT_POSITION_ATTRIBUTE;
    use crate::dimension::AggregationKind;
    use crate::snapshot::{PropSnapshot, PropValue};
    use crate::triggers::UpdateTriggers;
    use alloc::vec;

    fn bin() -> Dimension {
        Dimension::new("bin")
            .props(["cellSize"])
            .accessors(["getPosition"])
    }

    fn ready(dims: Vec<Dimension>) -> AggregationTracker {
        let mut tracker = AggregationTracker::new();
        tracker
            .initialize(dims, ["cellSize", "color", "data", "radius"])
            .unwrap();
        tracker
    }

    #[test]
    fn rendering_only_change_is_clean() {
        let mut tracker = ready(vec![bin()]);
        let old = PropSnapshot::new().with("cellSize", 10).with("color", "red");
        let new = PropSnapshot::new().with("cellSize", 10).with("color", "blue");
        let triggers = UpdateTriggers::none();
        let decisions = tracker
            .on_configuration_changed(&PropUpdate::new(&old, &new, &triggers))
            .unwrap();
        assert_eq!(decisions.is_dirty("bin"), Ok(false));
        assert!(!decisions.any_dirty());
    }

    #[test]
    fn declared_prop_change_is_dirty() {
        let mut tracker = ready(vec![bin()]);
        let old = PropSnapshot::new().with("cellSize", 10).with("color", "red");
        let new = PropSnapshot::new().with("cellSize", 20).with("color", "red");
        let triggers = UpdateTriggers::none();
        let decisions = tracker
            .on_configuration_changed(&PropUpdate::new(&old, &new, &triggers))
            .unwrap();
        assert_eq!(decisions.is_dirty("bin"), Ok(true));
        assert_eq!(decisions.dirty_names().collect::<Vec<_>>(), ["bin"]);
    }

    #[test]
    fn accessor_trigger_overrides_equal_values() {
        let mut tracker = ready(vec![bin()]);
        let props = PropSnapshot::new().with("cellSize", 10);
        let triggers = UpdateTriggers::none().with_changed("getPosition");
        let decisions = tracker
            .on_configuration_changed(&PropUpdate::new(&props, &props, &triggers))
            .unwrap();
        assert_eq!(decisions.is_dirty("bin"), Ok(true));
    }

    #[test]
    fn all_trigger_dirties_every_dimension() {
        let mut tracker = ready(vec![bin(), Dimension::new("count")]);
        let props = PropSnapshot::new();
        let triggers = UpdateTriggers::all();
        let decisions = tracker
            .on_configuration_changed(&PropUpdate::new(&props, &props, &triggers))
            .unwrap();
        assert!(decisions.iter().all(|v| v.dirty));
        assert_eq!(decisions.len(), 2);
    }

    #[test]
    fn decisions_are_idempotent() {
        let mut tracker = ready(vec![bin(), Dimension::new("count").props(["radius"])]);
        let old = PropSnapshot::new().with("cellSize", 10).with("radius", 1);
        let new = PropSnapshot::new().with("cellSize", 10).with("radius", 2);
        let triggers = UpdateTriggers::none();
        let update = PropUpdate::new(&old, &new, &triggers);

        let first = tracker.on_configuration_changed(&update).unwrap();
        let second = tracker.on_configuration_changed(&update).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.is_dirty("bin"), Ok(false));
        assert_eq!(first.is_dirty("count"), Ok(true));
        assert_eq!(tracker.cycle(), 2);
    }

    #[test]
    fn single_dimension_query_matches_batch() {
        let mut tracker = ready(vec![bin(), Dimension::new("count").props(["radius"])]);
        let old = PropSnapshot::new().with("radius", 1);
        let new = PropSnapshot::new().with("radius", 2);
        let triggers = UpdateTriggers::none();
        let update = PropUpdate::new(&old, &new, &triggers);

        let decisions = tracker.on_configuration_changed(&update).unwrap();
        for verdict in &decisions {
            assert_eq!(
                tracker.is_dimension_dirty(&verdict.name, &update),
                Ok(verdict.dirty)
            );
        }
    }

    #[test]
    fn structural_dimension_uses_ignore_set() {
        let mut tracker = ready(vec![
            Dimension::new("grid")
                .props(["cellSize"])
                .detect_structural_change(true),
        ]);
        let old = PropSnapshot::new().with("color", "red").with("opacity", 1.0);
        let new = PropSnapshot::new().with("color", "blue").with("opacity", 0.5);
        let triggers = UpdateTriggers::none();

        let update = PropUpdate::new(&old, &new, &triggers);
        assert_eq!(tracker.is_dimension_dirty("grid", &update), Ok(false));

        let update = update.with_structure_changed(true);
        let decisions = tracker.on_configuration_changed(&update).unwrap();
        assert_eq!(decisions.is_dirty("grid"), Ok(true));
    }

    #[test]
    fn update_before_initialize_fails() {
        let mut tracker = AggregationTracker::new();
        let props = PropSnapshot::new();
        let triggers = UpdateTriggers::none();
        let update = PropUpdate::new(&props, &props, &triggers);
        assert_eq!(
            tracker.on_configuration_changed(&update),
            Err(TrackerError::NotInitialized)
        );
        assert_eq!(
            tracker.is_dimension_dirty("bin", &update),
            Err(TrackerError::NotInitialized)
        );
        assert_eq!(tracker.reshape(["a"]), Err(TrackerError::NotInitialized));
        assert_eq!(
            tracker.on_structure_changed(ShaderConfig::new()),
            Err(TrackerError::NotInitialized)
        );
    }

    #[test]
    fn initialize_twice_fails() {
        let mut tracker = ready(vec![bin()]);
        assert_eq!(
            tracker.initialize(vec![bin()], ["cellSize"]),
            Err(TrackerError::AlreadyInitialized)
        );
    }

    #[test]
    fn duplicate_dimension_is_rejected() {
        let mut tracker = AggregationTracker::new();
        assert_eq!(
            tracker.initialize(vec![bin(), bin()], ["cellSize"]),
            Err(TrackerError::DuplicateDimension("bin".into()))
        );
        assert!(!tracker.is_ready());
    }

    #[test]
    fn unknown_dimension_is_an_error() {
        let mut tracker = ready(vec![bin()]);
        let props = PropSnapshot::new();
        let triggers = UpdateTriggers::none();
        let update = PropUpdate::new(&props, &props, &triggers);
        let decisions = tracker.on_configuration_changed(&update).unwrap();
        assert_eq!(
            decisions.is_dirty("missing"),
            Err(TrackerError::UnknownDimension("missing".into()))
        );
        assert_eq!(
            tracker.is_dimension_dirty("missing", &update),
            Err(TrackerError::UnknownDimension("missing".into()))
        );
    }

    #[test]
    fn report_before_first_update_fails() {
        let tracker = ready(vec![bin()]);
        assert_eq!(
            tracker.current_report(),
            Err(TrackerError::NotYetComputed)
        );
    }

    #[test]
    fn attribute_report_replaces_previous() {
        let mut tracker = ready(vec![bin()]);

        let report = tracker.on_attributes_changed(["colors"], DEFAULT_POSITION_ATTRIBUTE);
        assert!(!report.positions_changed());

        tracker.on_attributes_changed(["positions", "colors"], DEFAULT_POSITION_ATTRIBUTE);
        let report = tracker.current_report().unwrap();
        assert!(report.positions_changed());
        assert!(report.contains("colors"));

        tracker.on_attributes_changed(Vec::<String>::new(), DEFAULT_POSITION_ATTRIBUTE);
        let report = tracker.current_report().unwrap();
        assert!(!report.attributes_changed());
        assert!(!report.positions_changed());
    }

    #[test]
    fn position_change_invalidates_derived_resources() {
        let mut tracker = ready(vec![bin()]);
        tracker
            .register_derived_resource("spatialIndex", ["positions"])
            .unwrap();
        tracker
            .register_derived_resource("binBuffer", ["spatialIndex"])
            .unwrap();

        let report = tracker.on_attributes_changed(["positions"], DEFAULT_POSITION_ATTRIBUTE);
        let stale = report.stale_resources();
        assert_eq!(stale.len(), 2);
        assert!(stale.iter().any(|s| s == "spatialIndex"));
        assert!(stale.iter().any(|s| s == "binBuffer"));

        let report = tracker.on_attributes_changed(["colors"], DEFAULT_POSITION_ATTRIBUTE);
        assert!(report.stale_resources().is_empty());
    }

    #[test]
    fn resource_cycle_is_rejected() {
        let mut tracker = ready(vec![bin()]);
        tracker.register_derived_resource("a", ["b"]).unwrap();
        assert!(matches!(
            tracker.register_derived_resource("b", ["a"]),
            Err(TrackerError::DependencyCycle { .. })
        ));

        let report = tracker.on_attributes_changed(["b"], DEFAULT_POSITION_ATTRIBUTE);
        assert_eq!(report.stale_resources(), ["a"]);
    }

    #[test]
    fn identical_snapshots_are_clean_in_both_modes() {
        let grid = Dimension::new("grid")
            .props(["cellSize"])
            .detect_structural_change(true);
        let mut tracker = ready(vec![bin(), grid]);

        let data = PropValue::shared(vec![1.0_f64, 2.0]);
        let old = PropSnapshot::new()
            .with("data", data.clone())
            .with("cellSize", 10)
            .with("extraKey", "x");
        let new = old.clone();
        let triggers = UpdateTriggers::none();
        let update = PropUpdate::new(&old, &new, &triggers);

        let decisions = tracker.on_configuration_changed(&update).unwrap();
        assert_eq!(decisions.is_dirty("bin"), Ok(false));
        assert_eq!(decisions.is_dirty("grid"), Ok(false));
        assert!(!decisions.any_dirty());
        assert_eq!(tracker.is_dimension_dirty("bin", &update), Ok(false));
        assert_eq!(tracker.is_dimension_dirty("grid", &update), Ok(false));
    }

    #[test]
    fn reshape_rebuilds_only_on_new_key_set() {
        let mut tracker = ready(vec![bin()]);
        assert_eq!(
            tracker.reshape(["radius", "data", "color", "cellSize"]),
            Ok(false)
        );
        assert!(!tracker.ignore_set("bin").unwrap().contains("weight"));

        assert_eq!(
            tracker.reshape(["cellSize", "color", "data", "radius", "weight"]),
            Ok(true)
        );
        assert!(tracker.ignore_set("bin").unwrap().contains("weight"));
        assert!(!tracker.ignore_set("bin").unwrap().contains("cellSize"));
    }

    #[test]
    fn custom_framework_keys_reach_ignore_sets() {
        let mut tracker = AggregationTracker::with_config(TrackerConfig::schema_only());
        tracker.initialize(vec![bin()], ["cellSize", "color"]).unwrap();
        let ignore = tracker.ignore_set("bin").unwrap();
        assert!(ignore.contains("color"));
        assert!(!ignore.contains("opacity"));
        assert_eq!(ignore.len(), 1);
    }

    #[test]
    fn structure_change_patches_shaders_for_gpu_dimensions() {
        let tracker = ready(vec![
            bin(),
            Dimension::new("heat").kind(AggregationKind::Gpu {
                model: "heatmapModel".into(),
            }),
        ]);
        let updates = tracker
            .on_structure_changed(ShaderConfig::new().with_module("project"))
            .unwrap();
        assert_eq!(updates.len(), 1);
        let update = &updates[0];
        assert_eq!(update.dimension, "heat");
        assert_eq!(update.model, "heatmapModel");
        assert_eq!(update.shaders.define(NON_INSTANCED_MODEL), Some(1));
        assert_eq!(update.shaders.modules, ["project"]);
    }

    #[test]
    fn teardown_returns_to_uninitialized() {
        let mut tracker = AggregationTracker::with_config(TrackerConfig::schema_only());
        tracker.initialize(vec![bin()], ["cellSize"]).unwrap();
        tracker.on_attributes_changed(["positions"], DEFAULT_POSITION_ATTRIBUTE);
        tracker.teardown();

        assert_eq!(tracker.state(), TrackerState::Uninitialized);
        assert!(tracker.dimensions().is_empty());
        assert_eq!(
            tracker.current_report(),
            Err(TrackerError::NotYetComputed)
        );
        tracker.initialize(vec![bin()], ["cellSize"]).unwrap();
        assert_eq!(tracker.ignore_set("bin").map(IgnoreSet::len), Ok(0));
    }

    #[cfg(feature = "trace")]
    #[test]
    fn traced_cycle_reports_verdicts() {
        use crate::classify::DirtyReason;
        use crate::trace::TraceSink;

        #[derive(Default)]
        struct Collect {
            begins: u32,
            verdicts: Vec<(String, Option<&'static str>)>,
            summary: Option<CycleSummary>,
        }
        impl TraceSink for Collect {
            fn on_cycle_begin(&mut self, _e: &CycleBeginEvent) {
                self.begins += 1;
            }
            fn on_verdict(&mut self, e: &VerdictEvent<'_>) {
                self.verdicts
                    .push((e.name.into(), e.reason.as_ref().map(DirtyReason::label)));
            }
            fn on_cycle_summary(&mut self, s: &CycleSummary) {
                self.summary = Some(*s);
            }
        }

        let mut tracker = ready(vec![bin(), Dimension::new("count").props(["radius"])]);
        let old = PropSnapshot::new().with("cellSize", 10);
        let new = PropSnapshot::new().with("cellSize", 20);
        let triggers = UpdateTriggers::none();

        let mut sink = Collect::default();
        let mut tracer = Tracer::new(&mut sink);
        tracker
            .on_configuration_changed_traced(&PropUpdate::new(&old, &new, &triggers), &mut tracer)
            .unwrap();
        drop(tracer);

        assert_eq!(sink.begins, 1);
        assert_eq!(
            sink.verdicts,
            [
                (String::from("bin"), Some("prop-changed")),
                (String::from("count"), None),
            ]
        );
        assert_eq!(
            sink.summary,
            Some(CycleSummary {
                cycle: 1,
                dirty: 1,
                clean: 1,
            })
        );
    }
}

// Copyright 2026 the Regather Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated update cycles that exercise the tracker and the diagnostics
//! pipeline.
//!
//! Drives a three-dimension layer through a scripted sequence of
//! configuration, attribute and extension changes, recording events to both a
//! [`PrettyPrintSink`](regather_debug::pretty::PrettyPrintSink) and a
//! [`RecorderSink`](regather_debug::recorder::RecorderSink), then exports the
//! recording as JSON.

use std::fs::File;
use std::io::BufWriter;

use regather_core::attributes::DEFAULT_POSITION_ATTRIBUTE;
use regather_core::classify::PropUpdate;
use regather_core::dimension::{AggregationKind, Dimension, ShaderConfig};
use regather_core::settings::{FrameContext, ModuleSettings};
use regather_core::snapshot::{PropSnapshot, PropValue};
use regather_core::trace::{
    AttributesEvent, CycleBeginEvent, CycleSummary, IgnoreSetsRebuiltEvent, ModelUpdateEvent,
    TraceSink, Tracer, VerdictEvent,
};
use regather_core::tracker::AggregationTracker;
use regather_core::triggers::UpdateTriggers;

use regather_debug::pretty::PrettyPrintSink;
use regather_debug::recorder::RecorderSink;

/// Forwards every event to two sinks.
struct Tee<'a> {
    first: &'a mut dyn TraceSink,
    second: &'a mut dyn TraceSink,
}

impl TraceSink for Tee<'_> {
    fn on_cycle_begin(&mut self, e: &CycleBeginEvent) {
        self.first.on_cycle_begin(e);
        self.second.on_cycle_begin(e);
    }

    fn on_verdict(&mut self, e: &VerdictEvent<'_>) {
        self.first.on_verdict(e);
        self.second.on_verdict(e);
    }

    fn on_cycle_summary(&mut self, s: &CycleSummary) {
        self.first.on_cycle_summary(s);
        self.second.on_cycle_summary(s);
    }

    fn on_ignore_sets_rebuilt(&mut self, e: &IgnoreSetsRebuiltEvent) {
        self.first.on_ignore_sets_rebuilt(e);
        self.second.on_ignore_sets_rebuilt(e);
    }

    fn on_attributes(&mut self, e: &AttributesEvent) {
        self.first.on_attributes(e);
        self.second.on_attributes(e);
    }

    fn on_model_update(&mut self, e: &ModelUpdateEvent<'_>) {
        self.first.on_model_update(e);
        self.second.on_model_update(e);
    }
}

/// One scripted step of the simulation.
struct Step {
    label: &'static str,
    props: PropSnapshot,
    triggers: UpdateTriggers,
    structure_changed: bool,
    attributes: &'static [&'static str],
}

const KNOWN_KEYS: &[&str] = &[
    "data",
    "cellSize",
    "colorRange",
    "elevationScale",
    "radiusPixels",
    "weightScale",
];

fn dimensions() -> Vec<Dimension> {
    vec![
        Dimension::new("bin")
            .props(["cellSize"])
            .accessors(["getPosition"]),
        Dimension::new("weight")
            .props(["weightScale"])
            .accessors(["getWeight"]),
        Dimension::new("heat")
            .props(["radiusPixels"])
            .detect_structural_change(true)
            .kind(AggregationKind::Gpu {
                model: "heatmapWeights".into(),
            }),
    ]
}

fn base_props(data: &PropValue) -> PropSnapshot {
    PropSnapshot::new()
        .with("data", data.clone())
        .with("cellSize", 100)
        .with("colorRange", "viridis")
        .with("elevationScale", 1)
        .with("radiusPixels", 30)
        .with("weightScale", 1)
}

fn script(data: &PropValue) -> Vec<Step> {
    vec![
        Step {
            label: "color scale only",
            props: base_props(data).with("colorRange", "magma"),
            triggers: UpdateTriggers::none(),
            structure_changed: false,
            attributes: &["colors"],
        },
        Step {
            label: "cell size",
            props: base_props(data).with("cellSize", 200),
            triggers: UpdateTriggers::none(),
            structure_changed: false,
            attributes: &[],
        },
        Step {
            label: "positions accessor",
            props: base_props(data),
            triggers: UpdateTriggers::none().with_changed("getPosition"),
            structure_changed: false,
            attributes: &["positions"],
        },
        Step {
            label: "new data array",
            props: base_props(&PropValue::shared(vec![1.0_f64, 2.0, 3.0])),
            triggers: UpdateTriggers::all(),
            structure_changed: false,
            attributes: &["positions", "weights"],
        },
        Step {
            label: "extensions changed",
            props: base_props(data),
            triggers: UpdateTriggers::none(),
            structure_changed: true,
            attributes: &[],
        },
    ]
}

fn main() {
    // -- sinks -------------------------------------------------------------
    let mut pretty = PrettyPrintSink::new(Box::new(std::io::stdout()));
    let mut recorder = RecorderSink::new();

    // -- tracker -----------------------------------------------------------
    let mut tracker = AggregationTracker::new();
    tracker
        .initialize(dimensions(), KNOWN_KEYS)
        .expect("dimension names are unique");
    tracker
        .register_derived_resource("spatialIndex", [DEFAULT_POSITION_ATTRIBUTE])
        .expect("no cycle");
    tracker
        .register_derived_resource("binBuffer", ["spatialIndex", "weights"])
        .expect("no cycle");

    let data = PropValue::shared(vec![0.5_f64, 1.5, 2.5]);
    let frame = FrameContext {
        drawing_buffer_width: 2048,
        css_width: 1024.0,
        ..FrameContext::default()
    };

    // -- simulated cycles --------------------------------------------------
    let mut previous = base_props(&data);
    for step in script(&data) {
        println!("== {} ==", step.label);
        let mut tee = Tee {
            first: &mut pretty,
            second: &mut recorder,
        };
        let mut tracer = Tracer::new(&mut tee);

        let update = PropUpdate::new(&previous, &step.props, &step.triggers)
            .with_structure_changed(step.structure_changed);
        let decisions = tracker
            .on_configuration_changed_traced(&update, &mut tracer)
            .expect("tracker is initialized");

        if step.structure_changed {
            let shaders = ShaderConfig::new().with_module("project32");
            let updates = tracker
                .on_structure_changed_traced(shaders, &mut tracer)
                .expect("tracker is initialized");
            println!("   {} model(s) to rebuild", updates.len());
        }

        let report = tracker.on_attributes_changed_traced(
            step.attributes.iter().copied(),
            DEFAULT_POSITION_ATTRIBUTE,
            &mut tracer,
        );
        if !report.stale_resources().is_empty() {
            println!("   stale: {}", report.stale_resources().join(", "));
        }

        if decisions.any_dirty() {
            let settings = ModuleSettings::from_context(&step.props, &frame);
            let dirty: Vec<&str> = decisions.dirty_names().collect();
            println!(
                "   recompute [{}] at dpr={}",
                dirty.join(", "),
                settings.device_pixel_ratio
            );
        }

        previous = step.props;
    }

    // A schema with a new key rebuilds the ignore sets once.
    let mut extended: Vec<&str> = KNOWN_KEYS.to_vec();
    extended.push("opacityScale");
    {
        let mut tee = Tee {
            first: &mut pretty,
            second: &mut recorder,
        };
        let mut tracer = Tracer::new(&mut tee);
        tracker
            .reshape_traced(extended.iter().copied(), &mut tracer)
            .expect("tracker is initialized");
        tracker
            .reshape_traced(extended.iter().copied(), &mut tracer)
            .expect("tracker is initialized");
    }

    // -- export JSON -------------------------------------------------------
    let path = "cycles.json";
    let file = File::create(path).expect("failed to create cycles.json");
    let mut writer = BufWriter::new(file);
    regather_debug::json::export(recorder.as_bytes(), &mut writer)
        .expect("failed to write JSON export");

    println!("Wrote {path} ({} cycles)", tracker.cycle());
}

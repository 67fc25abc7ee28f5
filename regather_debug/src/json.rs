// Copyright 2026 the Regather Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes them as a JSON array with one object per event. Every object
//! carries an `"event"` field naming its kind.

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as a pretty-printed JSON array.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let events: Vec<Value> = decode(bytes).map(|e| to_json(&e)).collect();
    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn to_json(event: &RecordedEvent) -> Value {
    match event {
        RecordedEvent::CycleBegin(e) => json!({
            "event": "cycle_begin",
            "cycle": e.cycle,
            "dimension_count": e.dimension_count,
            "structure_changed": e.structure_changed,
            "all_triggers": e.all_triggers,
        }),
        RecordedEvent::Verdict {
            cycle,
            dimension,
            name,
            reason,
        } => {
            let reason = reason.as_ref().map(|r| r.as_reason());
            json!({
                "event": "verdict",
                "cycle": cycle,
                "dimension": dimension,
                "name": name,
                "dirty": reason.is_some(),
                "reason": reason.map(|r| r.label()),
                "subject": reason.as_ref().and_then(|r| r.subject()),
            })
        }
        RecordedEvent::CycleSummary(s) => json!({
            "event": "cycle_summary",
            "cycle": s.cycle,
            "dirty": s.dirty,
            "clean": s.clean,
        }),
        RecordedEvent::IgnoreSetsRebuilt(e) => json!({
            "event": "ignore_sets_rebuilt",
            "shape_keys": e.shape_keys,
            "dimensions": e.dimensions,
        }),
        RecordedEvent::Attributes(e) => json!({
            "event": "attributes",
            "cycle": e.cycle,
            "changed": e.changed,
            "positions_changed": e.positions_changed,
            "stale_resources": e.stale_resources,
        }),
        RecordedEvent::ModelUpdate { dimension, model } => json!({
            "event": "model_update",
            "dimension": dimension,
            "model": model,
        }),
    }
}

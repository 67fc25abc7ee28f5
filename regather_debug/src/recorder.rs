// Copyright 2026 the Regather Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records. Strings (dimension, key and model
//! names) are stored with a `u32` length prefix. [`decode`] reads the records
//! back as an iterator of owned [`RecordedEvent`]s.

use regather_core::classify::DirtyReason;
use regather_core::trace::{
    AttributesEvent, CycleBeginEvent, CycleSummary, IgnoreSetsRebuiltEvent, ModelUpdateEvent,
    TraceSink, VerdictEvent,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_CYCLE_BEGIN: u8 = 1;
const TAG_VERDICT: u8 = 2;
const TAG_CYCLE_SUMMARY: u8 = 3;
const TAG_IGNORE_SETS_REBUILT: u8 = 4;
const TAG_ATTRIBUTES: u8 = 5;
const TAG_MODEL_UPDATE: u8 = 6;

const REASON_CLEAN: u8 = 0;
const REASON_ALL_TRIGGERS: u8 = 1;
const REASON_ACCESSOR_TRIGGER: u8 = 2;
const REASON_STRUCTURE_CHANGED: u8 = 3;
const REASON_PROP_CHANGED: u8 = 4;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_str(&mut self, s: &str) {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "names longer than u32::MAX bytes are truncated for recording"
        )]
        let len = s.len().min(u32::MAX as usize) as u32;
        self.write_u32(len);
        self.buf.extend_from_slice(&s.as_bytes()[..len as usize]);
    }

    fn write_reason(&mut self, reason: Option<&DirtyReason<'_>>) {
        match reason {
            None => self.write_u8(REASON_CLEAN),
            Some(DirtyReason::AllTriggers) => self.write_u8(REASON_ALL_TRIGGERS),
            Some(DirtyReason::AccessorTrigger(accessor)) => {
                self.write_u8(REASON_ACCESSOR_TRIGGER);
                self.write_str(accessor);
            }
            Some(DirtyReason::StructureChanged) => self.write_u8(REASON_STRUCTURE_CHANGED),
            Some(DirtyReason::PropChanged(key)) => {
                self.write_u8(REASON_PROP_CHANGED);
                self.write_str(key);
            }
        }
    }
}

impl TraceSink for RecorderSink {
    fn on_cycle_begin(&mut self, e: &CycleBeginEvent) {
        self.write_u8(TAG_CYCLE_BEGIN);
        self.write_u64(e.cycle);
        self.write_u32(e.dimension_count);
        self.write_bool(e.structure_changed);
        self.write_bool(e.all_triggers);
    }

    fn on_verdict(&mut self, e: &VerdictEvent<'_>) {
        self.write_u8(TAG_VERDICT);
        self.write_u64(e.cycle);
        self.write_u32(e.dimension);
        self.write_str(e.name);
        self.write_reason(e.reason.as_ref());
    }

    fn on_cycle_summary(&mut self, s: &CycleSummary) {
        self.write_u8(TAG_CYCLE_SUMMARY);
        self.write_u64(s.cycle);
        self.write_u32(s.dirty);
        self.write_u32(s.clean);
    }

    fn on_ignore_sets_rebuilt(&mut self, e: &IgnoreSetsRebuiltEvent) {
        self.write_u8(TAG_IGNORE_SETS_REBUILT);
        self.write_u32(e.shape_keys);
        self.write_u32(e.dimensions);
    }

    fn on_attributes(&mut self, e: &AttributesEvent) {
        self.write_u8(TAG_ATTRIBUTES);
        self.write_u64(e.cycle);
        self.write_u32(e.changed);
        self.write_bool(e.positions_changed);
        self.write_u32(e.stale_resources);
    }

    fn on_model_update(&mut self, e: &ModelUpdateEvent<'_>) {
        self.write_u8(TAG_MODEL_UPDATE);
        self.write_str(e.dimension);
        self.write_str(e.model);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// An owned [`DirtyReason`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedReason {
    /// See [`DirtyReason::AllTriggers`].
    AllTriggers,
    /// See [`DirtyReason::AccessorTrigger`].
    AccessorTrigger(String),
    /// See [`DirtyReason::StructureChanged`].
    StructureChanged,
    /// See [`DirtyReason::PropChanged`].
    PropChanged(String),
}

impl RecordedReason {
    /// Borrows this reason as a [`DirtyReason`].
    #[must_use]
    pub fn as_reason(&self) -> DirtyReason<'_> {
        match self {
            Self::AllTriggers => DirtyReason::AllTriggers,
            Self::AccessorTrigger(accessor) => DirtyReason::AccessorTrigger(accessor),
            Self::StructureChanged => DirtyReason::StructureChanged,
            Self::PropChanged(key) => DirtyReason::PropChanged(key),
        }
    }
}

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`CycleBeginEvent`].
    CycleBegin(CycleBeginEvent),
    /// A [`VerdictEvent`].
    Verdict {
        /// Cycle counter.
        cycle: u64,
        /// Registration index of the dimension.
        dimension: u32,
        /// Dimension name.
        name: String,
        /// Why the dimension is dirty, or `None` if it is clean.
        reason: Option<RecordedReason>,
    },
    /// A [`CycleSummary`].
    CycleSummary(CycleSummary),
    /// An [`IgnoreSetsRebuiltEvent`].
    IgnoreSetsRebuilt(IgnoreSetsRebuiltEvent),
    /// An [`AttributesEvent`].
    Attributes(AttributesEvent),
    /// A [`ModelUpdateEvent`].
    ModelUpdate {
        /// Owning dimension.
        dimension: String,
        /// Model to rebuild.
        model: String,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_bool(&mut self) -> Option<bool> {
        Some(self.read_u8()? != 0)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_string(&mut self) -> Option<String> {
        let len = usize::try_from(self.read_u32()?).ok()?;
        if self.remaining() < len {
            return None;
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        String::from_utf8(bytes.to_vec()).ok()
    }

    fn read_reason(&mut self) -> Option<Option<RecordedReason>> {
        Some(match self.read_u8()? {
            REASON_CLEAN => None,
            REASON_ALL_TRIGGERS => Some(RecordedReason::AllTriggers),
            REASON_ACCESSOR_TRIGGER => Some(RecordedReason::AccessorTrigger(self.read_string()?)),
            REASON_STRUCTURE_CHANGED => Some(RecordedReason::StructureChanged),
            REASON_PROP_CHANGED => Some(RecordedReason::PropChanged(self.read_string()?)),
            _ => return None,
        })
    }

    fn decode_cycle_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::CycleBegin(CycleBeginEvent {
            cycle: self.read_u64()?,
            dimension_count: self.read_u32()?,
            structure_changed: self.read_bool()?,
            all_triggers: self.read_bool()?,
        }))
    }

    fn decode_verdict(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Verdict {
            cycle: self.read_u64()?,
            dimension: self.read_u32()?,
            name: self.read_string()?,
            reason: self.read_reason()?,
        })
    }

    fn decode_cycle_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::CycleSummary(CycleSummary {
            cycle: self.read_u64()?,
            dirty: self.read_u32()?,
            clean: self.read_u32()?,
        }))
    }

    fn decode_ignore_sets_rebuilt(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::IgnoreSetsRebuilt(IgnoreSetsRebuiltEvent {
            shape_keys: self.read_u32()?,
            dimensions: self.read_u32()?,
        }))
    }

    fn decode_attributes(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Attributes(AttributesEvent {
            cycle: self.read_u64()?,
            changed: self.read_u32()?,
            positions_changed: self.read_bool()?,
            stale_resources: self.read_u32()?,
        }))
    }

    fn decode_model_update(&mut self) -> Option<RecordedEvent> {
        let dimension = self.read_string()?;
        let model = self.read_string()?;
        Some(RecordedEvent::ModelUpdate { dimension, model })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_CYCLE_BEGIN => self.decode_cycle_begin(),
            TAG_VERDICT => self.decode_verdict(),
            TAG_CYCLE_SUMMARY => self.decode_cycle_summary(),
            TAG_IGNORE_SETS_REBUILT => self.decode_ignore_sets_rebuilt(),
            TAG_ATTRIBUTES => self.decode_attributes(),
            TAG_MODEL_UPDATE => self.decode_model_update(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_begin() -> CycleBeginEvent {
        CycleBeginEvent {
            cycle: 7,
            dimension_count: 2,
            structure_changed: true,
            all_triggers: false,
        }
    }

    #[test]
    fn cycle_records_decode_in_order() {
        let mut rec = RecorderSink::new();
        rec.on_cycle_begin(&sample_begin());
        rec.on_verdict(&VerdictEvent {
            cycle: 7,
            dimension: 0,
            name: "bin",
            reason: Some(DirtyReason::PropChanged("cellSize")),
        });
        rec.on_verdict(&VerdictEvent {
            cycle: 7,
            dimension: 1,
            name: "count",
            reason: None,
        });
        rec.on_cycle_summary(&CycleSummary {
            cycle: 7,
            dirty: 1,
            clean: 1,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0], RecordedEvent::CycleBegin(sample_begin()));
        match &events[1] {
            RecordedEvent::Verdict {
                cycle,
                dimension,
                name,
                reason,
            } => {
                assert_eq!(*cycle, 7);
                assert_eq!(*dimension, 0);
                assert_eq!(name, "bin");
                assert_eq!(
                    reason.as_ref().map(RecordedReason::as_reason),
                    Some(DirtyReason::PropChanged("cellSize"))
                );
            }
            other => panic!("expected Verdict, got {other:?}"),
        }
        assert!(matches!(
            &events[2],
            RecordedEvent::Verdict { reason: None, .. }
        ));
        assert!(matches!(
            events[3],
            RecordedEvent::CycleSummary(CycleSummary { dirty: 1, .. })
        ));
    }

    #[test]
    fn every_reason_survives_recording() {
        let reasons = [
            DirtyReason::AllTriggers,
            DirtyReason::AccessorTrigger("getPosition"),
            DirtyReason::StructureChanged,
            DirtyReason::PropChanged("radius"),
        ];
        let mut rec = RecorderSink::new();
        for reason in reasons {
            rec.on_verdict(&VerdictEvent {
                cycle: 1,
                dimension: 0,
                name: "bin",
                reason: Some(reason),
            });
        }
        let decoded: Vec<_> = decode(rec.as_bytes())
            .filter_map(|e| match e {
                RecordedEvent::Verdict { reason, .. } => reason,
                _ => None,
            })
            .collect();
        assert_eq!(decoded.len(), reasons.len());
        for (recorded, original) in decoded.iter().zip(reasons) {
            assert_eq!(recorded.as_reason(), original);
        }
    }

    #[test]
    fn model_update_keeps_names() {
        let mut rec = RecorderSink::new();
        rec.on_model_update(&ModelUpdateEvent {
            dimension: "heat",
            model: "heatmapModel",
        });
        rec.on_attributes(&AttributesEvent {
            cycle: 2,
            changed: 3,
            positions_changed: true,
            stale_resources: 1,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(
            events[0],
            RecordedEvent::ModelUpdate {
                dimension: "heat".into(),
                model: "heatmapModel".into(),
            }
        );
        match &events[1] {
            RecordedEvent::Attributes(e) => {
                assert!(e.positions_changed);
                assert_eq!(e.stale_resources, 1);
            }
            other => panic!("expected Attributes, got {other:?}"),
        }
    }

    #[test]
    fn truncated_record_stops_iteration() {
        let mut rec = RecorderSink::new();
        rec.on_ignore_sets_rebuilt(&IgnoreSetsRebuiltEvent {
            shape_keys: 12,
            dimensions: 2,
        });
        rec.on_cycle_begin(&sample_begin());
        let bytes = rec.into_bytes();

        let events: Vec<_> = decode(&bytes[..bytes.len() - 1]).collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], RecordedEvent::IgnoreSetsRebuilt(_)));
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }
}

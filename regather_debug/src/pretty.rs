// Copyright 2026 the Regather Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use regather_core::classify::DirtyReason;
use regather_core::trace::{
    AttributesEvent, CycleBeginEvent, CycleSummary, IgnoreSetsRebuiltEvent, ModelUpdateEvent,
    TraceSink, VerdictEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    verbose: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::with_writer(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            verbose: true,
        }
    }

    /// Builder-style: when `false`, clean verdicts are not printed.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn describe(reason: Option<&DirtyReason<'_>>) -> String {
    match reason {
        None => "clean".into(),
        Some(r) => match r.subject() {
            Some(subject) => format!("dirty ({} `{subject}`)", r.label()),
            None => format!("dirty ({})", r.label()),
        },
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_cycle_begin(&mut self, e: &CycleBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[cycle] #{} dimensions={} structure_changed={} all_triggers={}",
            e.cycle, e.dimension_count, e.structure_changed, e.all_triggers,
        );
    }

    fn on_verdict(&mut self, e: &VerdictEvent<'_>) {
        if e.reason.is_none() && !self.verbose {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[verdict] #{} {}:{} {}",
            e.cycle,
            e.dimension,
            e.name,
            describe(e.reason.as_ref()),
        );
    }

    fn on_cycle_summary(&mut self, s: &CycleSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] #{} dirty={} clean={}",
            s.cycle, s.dirty, s.clean,
        );
    }

    fn on_ignore_sets_rebuilt(&mut self, e: &IgnoreSetsRebuiltEvent) {
        let _ = writeln!(
            self.writer,
            "[reshape] keys={} ignore_sets={}",
            e.shape_keys, e.dimensions,
        );
    }

    fn on_attributes(&mut self, e: &AttributesEvent) {
        let positions = if e.positions_changed { "CHANGED" } else { "same" };
        let _ = writeln!(
            self.writer,
            "[attributes] #{} changed={} positions={positions} stale_resources={}",
            e.cycle, e.changed, e.stale_resources,
        );
    }

    fn on_model_update(&mut self, e: &ModelUpdateEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[model] {} rebuild {}",
            e.dimension, e.model,
        );
    }
}

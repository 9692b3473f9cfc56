//! Collects one summary per mode and fires the comparison once

use std::collections::HashMap;
use tracing::debug;
use crate::bench::sink::ModeObserver;
use crate::models::{ComparisonResult, ExecutionMode, ExecutionSummary};
use crate::report::compare;

/// Summaries keyed by mode, plus the comparison once it has been emitted
#[derive(Debug, Default)]
pub struct ResultCollector {
    summaries: HashMap<ExecutionMode, ExecutionSummary>,
    reported: Option<ComparisonResult>,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `summary` under its mode, replacing an earlier one for that mode
    pub fn record_summary(&mut self, summary: ExecutionSummary) {
        debug!(mode = %summary.mode, seconds = summary.duration_seconds, "summary recorded");
        self.summaries.insert(summary.mode, summary);
    }

    pub fn summary(&self, mode: ExecutionMode) -> Option<&ExecutionSummary> {
        self.summaries.get(&mode)
    }

    /// Whether both modes have reported
    pub fn is_complete(&self) -> bool {
        self.summaries.contains_key(&ExecutionMode::Threads)
            && self.summaries.contains_key(&ExecutionMode::Processes)
    }

    /// The comparison, if it has been emitted
    pub fn comparison(&self) -> Option<ComparisonResult> {
        self.reported
    }

    /// Compare the two modes and emit the result to `observer`.
    ///
    /// Does nothing until both summaries are present. The comparison is
    /// computed and emitted exactly once; later calls return the same value
    /// without emitting it again, even if a summary was overwritten since.
    pub fn compare_and_report(&mut self, observer: &dyn ModeObserver) -> Option<ComparisonResult> {
        if self.reported.is_some() {
            return self.reported;
        }

        let threads = self.summaries.get(&ExecutionMode::Threads)?;
        let processes = self.summaries.get(&ExecutionMode::Processes)?;
        let result = compare(threads, processes);

        self.reported = Some(result);
        observer.on_comparison(&result);
        Some(result)
    }
}

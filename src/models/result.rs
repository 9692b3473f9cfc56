//! Benchmark result data models
//!
//! Contains the per-mode execution summary, the derived comparison, and the
//! serializable report of one benchmark run.

use crate::config::BenchmarkConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The execution strategy being measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Two threads sharing one board
    Threads,
    /// Two isolated processes relaying moves to a coordinator
    Processes,
}

impl ExecutionMode {
    /// Prefix used in per-worker log lines
    pub fn worker_label(&self) -> &'static str {
        match self {
            ExecutionMode::Threads => "Thread",
            ExecutionMode::Processes => "Process",
        }
    }

    /// Get a human-readable description of the mode
    pub fn description(&self) -> &'static str {
        match self {
            ExecutionMode::Threads => "Threads",
            ExecutionMode::Processes => "Processes",
        }
    }

    /// Log line for one applied move; `sequence` is 1-based
    pub fn move_line(&self, worker_id: u32, sequence: u32) -> String {
        format!("{} {} made move {}", self.worker_label(), worker_id, sequence)
    }

    /// Log line for a worker that finished all of its moves
    pub fn completion_line(&self, worker_id: u32) -> String {
        match self {
            ExecutionMode::Threads => {
                format!("{} {} finished its moves.", self.worker_label(), worker_id)
            }
            ExecutionMode::Processes => {
                format!("{} {} finished its moves", self.worker_label(), worker_id)
            }
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Outcome of one execution mode, produced once all its workers finished
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    /// Mode that produced this summary
    pub mode: ExecutionMode,
    /// Wall time from worker spawn to join/teardown
    pub duration_seconds: f64,
    /// Board mutations applied during the run
    pub moves_applied: u64,
    /// Whether the coordinator stopped on dead workers instead of DONE messages
    #[serde(default)]
    pub liveness_fallback: bool,
}

impl ExecutionSummary {
    pub fn new(mode: ExecutionMode, elapsed: Duration, moves_applied: u64) -> Self {
        Self {
            mode,
            duration_seconds: elapsed.as_secs_f64(),
            moves_applied,
            liveness_fallback: false,
        }
    }

    /// Mark that the coordinator terminated through the liveness fallback
    pub fn with_liveness_fallback(mut self, fired: bool) -> Self {
        self.liveness_fallback = fired;
        self
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_seconds.max(0.0))
    }
}

/// Which mode won and by how much
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// The faster mode; exact ties go to [`ExecutionMode::Processes`]
    pub faster: ExecutionMode,
    /// Absolute difference in seconds
    pub margin: f64,
}

/// Everything one benchmark run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// Timestamp when the run was started
    pub timestamp: DateTime<Utc>,
    /// Configuration used for this run
    pub config: BenchmarkConfig,
    /// Thread mode summary, absent if the mode aborted
    pub threads: Option<ExecutionSummary>,
    /// Process mode summary, absent if the mode aborted
    pub processes: Option<ExecutionSummary>,
    /// Present once both modes reported
    pub comparison: Option<ComparisonResult>,
    /// Error messages of modes that aborted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<String>,
}

impl BenchmarkReport {
    pub fn new(config: BenchmarkConfig) -> Self {
        Self {
            timestamp: Utc::now(),
            config,
            threads: None,
            processes: None,
            comparison: None,
            failures: Vec::new(),
        }
    }

    /// Summary for the given mode, if it completed
    pub fn summary(&self, mode: ExecutionMode) -> Option<&ExecutionSummary> {
        match mode {
            ExecutionMode::Threads => self.threads.as_ref(),
            ExecutionMode::Processes => self.processes.as_ref(),
        }
    }

    /// Whether both modes completed
    pub fn is_complete(&self) -> bool {
        self.threads.is_some() && self.processes.is_some()
    }

    /// One-line description of the run
    pub fn headline(&self) -> String {
        match &self.comparison {
            Some(cmp) => format!(
                "{} - {} faster by {:.2} s",
                self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
                cmp.faster,
                cmp.margin
            ),
            None => format!(
                "{} - incomplete run",
                self.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
            ),
        }
    }
}

//! Collaborators the harness reports to
//!
//! A [`LogSink`] receives human-readable progress lines from both modes,
//! possibly interleaved. A [`ModeObserver`] is told when a mode completes and
//! when the final comparison is available.

use std::sync::Mutex;
use std::time::Duration;
use indicatif::{ProgressBar, ProgressStyle};
use crate::models::{ComparisonResult, ExecutionMode};

/// Receives progress lines; must tolerate calls from several threads
pub trait LogSink: Send + Sync {
    fn log(&self, line: &str);
}

impl<F> LogSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn log(&self, line: &str) {
        self(line)
    }
}

/// Notified about mode completion and the final comparison
pub trait ModeObserver: Send + Sync {
    /// Called exactly once per mode that completed
    fn on_mode_complete(&self, mode: ExecutionMode, duration_seconds: f64);

    /// Called once both modes have completed
    fn on_comparison(&self, _result: &ComparisonResult) {}
}

/// Observer that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ModeObserver for NoopObserver {
    fn on_mode_complete(&self, _mode: ExecutionMode, _duration_seconds: f64) {}
}

/// Sink that keeps every line in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the lines received so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().map(|l| l.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lines starting with `prefix`
    pub fn lines_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|l| l.starts_with(prefix))
            .collect()
    }
}

impl LogSink for MemorySink {
    fn log(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

/// Terminal sink: prints every line above a spinner counting them
pub struct ConsoleSink {
    progress: ProgressBar,
}

impl ConsoleSink {
    pub fn new() -> Self {
        let progress = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {pos} lines ({elapsed}) {msg}") {
            progress.set_style(style);
        }
        progress.enable_steady_tick(Duration::from_millis(100));
        Self { progress }
    }

    /// Set the message shown next to the spinner
    pub fn set_status(&self, status: impl Into<String>) {
        self.progress.set_message(status.into());
    }

    /// Stop the spinner, leaving printed lines in place
    pub fn finish(&self) {
        self.progress.finish_and_clear();
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for ConsoleSink {
    fn log(&self, line: &str) {
        // a hidden bar (stdout not a terminal) swallows println
        if self.progress.is_hidden() {
            println!("{}", line);
        } else {
            self.progress.println(line);
        }
        self.progress.inc(1);
    }
}

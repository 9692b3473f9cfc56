//! Benchmark entry point
//!
//! Validates the user's input, starts the thread mode immediately and the
//! process mode after a short offset, and lets both report to a shared
//! [`ResultCollector`] as they finish. The comparison fires once, when the
//! second mode reports.

use std::sync::{Arc, Mutex};
use tracing::{error, info};
use crate::bench::process::ProcessExecutionMode;
use crate::bench::sink::{LogSink, ModeObserver};
use crate::bench::threads::ThreadExecutionMode;
use crate::config::BenchmarkConfig;
use crate::models::{BenchmarkReport, ExecutionMode, ExecutionSummary};
use crate::report::ResultCollector;
use crate::{ChessBenchError, Result};

/// Runs both execution modes and compares them
pub struct BenchmarkHarness {
    sink: Arc<dyn LogSink>,
    observer: Arc<dyn ModeObserver>,
    process_mode: ProcessExecutionMode,
}

impl BenchmarkHarness {
    pub fn new(
        sink: Arc<dyn LogSink>,
        observer: Arc<dyn ModeObserver>,
        process_mode: ProcessExecutionMode,
    ) -> Self {
        Self {
            sink,
            observer,
            process_mode,
        }
    }

    /// Harness whose process workers re-execute the running binary
    pub fn with_current_exe(sink: Arc<dyn LogSink>, observer: Arc<dyn ModeObserver>) -> Result<Self> {
        Ok(Self::new(sink, observer, ProcessExecutionMode::from_current_exe()?))
    }

    /// Validate raw move count and interval, then run the benchmark.
    ///
    /// Malformed input fails with [`ChessBenchError::Validation`] before the
    /// sink or the observer is called.
    pub async fn start_benchmark(
        &self,
        base: BenchmarkConfig,
        moves: &str,
        interval_millis: &str,
    ) -> Result<BenchmarkReport> {
        let config = base.with_inputs(moves, interval_millis)?;
        self.run(config).await
    }

    /// Run both modes with an already validated configuration
    pub async fn run(&self, config: BenchmarkConfig) -> Result<BenchmarkReport> {
        config.validate()?;

        self.sink.log(&format!(
            "Configuration: {} moves, {}ms interval, buffer: {}",
            config.moves_per_worker, config.interval_millis, config.buffer_size
        ));

        let config = Arc::new(config);
        let collector = Arc::new(Mutex::new(ResultCollector::new()));

        self.sink.log("=== STARTING THREADS ===");
        let threads = {
            let config = Arc::clone(&config);
            let sink = Arc::clone(&self.sink);
            let observer = Arc::clone(&self.observer);
            let collector = Arc::clone(&collector);
            tokio::spawn(async move {
                let outcome = ThreadExecutionMode::run(&config, Arc::clone(&sink)).await;
                complete_mode(ExecutionMode::Threads, outcome, &*sink, &*observer, &collector)
            })
        };

        let processes = {
            let config = Arc::clone(&config);
            let sink = Arc::clone(&self.sink);
            let observer = Arc::clone(&self.observer);
            let collector = Arc::clone(&collector);
            let process_mode = self.process_mode.clone();
            tokio::spawn(async move {
                tokio::time::sleep(config.process_start_delay).await;
                sink.log("=== STARTING PROCESSES ===");
                let outcome = process_mode.run(&config, Arc::clone(&sink)).await;
                complete_mode(ExecutionMode::Processes, outcome, &*sink, &*observer, &collector)
            })
        };

        let (threads, processes) = tokio::join!(threads, processes);

        let mut report = BenchmarkReport::new((*config).clone());
        for (mode, joined) in [(ExecutionMode::Threads, threads), (ExecutionMode::Processes, processes)] {
            match joined {
                Ok(Ok(summary)) => match mode {
                    ExecutionMode::Threads => report.threads = Some(summary),
                    ExecutionMode::Processes => report.processes = Some(summary),
                },
                Ok(Err(e)) => report.failures.push(format!("{}: {}", mode, e)),
                Err(e) => report.failures.push(format!("{}: task failed: {}", mode, e)),
            }
        }

        report.comparison = collector
            .lock()
            .map_err(|_| ChessBenchError::Worker("result collector lock poisoned".to_string()))?
            .comparison();

        info!(headline = %report.headline(), "benchmark finished");
        Ok(report)
    }
}

/// Completion callback shared by both modes
fn complete_mode(
    mode: ExecutionMode,
    outcome: Result<ExecutionSummary>,
    sink: &dyn LogSink,
    observer: &dyn ModeObserver,
    collector: &Mutex<ResultCollector>,
) -> Result<ExecutionSummary> {
    let summary = match outcome {
        Ok(summary) => summary,
        Err(e) => {
            error!(%mode, error = %e, "mode aborted");
            sink.log(&format!("{} aborted: {}", mode, e));
            return Err(e);
        }
    };

    observer.on_mode_complete(mode, summary.duration_seconds);

    let mut collector = collector
        .lock()
        .map_err(|_| ChessBenchError::Worker("result collector lock poisoned".to_string()))?;
    collector.record_summary(summary.clone());
    collector.compare_and_report(observer);
    Ok(summary)
}

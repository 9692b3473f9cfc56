use std::io::{self, Write};
use std::sync::Arc;

use crate::bench::sink::{ConsoleSink, LogSink, ModeObserver};
use crate::config::{BenchmarkConfig, DEFAULT_INTERVAL_MILLIS, DEFAULT_MOVES_PER_WORKER};
use crate::harness::BenchmarkHarness;
use crate::models::{BenchmarkReport, ComparisonResult, ExecutionMode};
use crate::report::render_summary;
use crate::util::units::format_seconds;
use crate::Result;

/// Prompt the user for move count and interval.
/// Empty answers keep the defaults; anything else is passed on unparsed.
pub fn ask_inputs() -> Result<(String, String)> {
    let moves = prompt("Moves per player", &DEFAULT_MOVES_PER_WORKER.to_string())?;
    let interval = prompt("Interval between moves (ms)", &DEFAULT_INTERVAL_MILLIS.to_string())?;
    Ok((moves, interval))
}

fn prompt(label: &str, default: &str) -> Result<String> {
    print!("{} (default {}): ", label, default);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let answer = input.trim();
    Ok(if answer.is_empty() {
        default.to_string()
    } else {
        answer.to_string()
    })
}

/// Prints mode completions and the comparison through the console sink
struct ConsoleObserver {
    sink: Arc<ConsoleSink>,
}

impl ModeObserver for ConsoleObserver {
    fn on_mode_complete(&self, mode: ExecutionMode, duration_seconds: f64) {
        self.sink.log(&format!("{} completed in {}", mode, format_seconds(duration_seconds)));
    }

    fn on_comparison(&self, result: &ComparisonResult) {
        self.sink.set_status(format!("{} won", result.faster));
    }
}

/// Run the benchmark on the terminal, streaming progress lines.
pub async fn run_console(base: BenchmarkConfig, moves: &str, interval: &str) -> Result<BenchmarkReport> {
    let sink = Arc::new(ConsoleSink::new());
    sink.set_status("running");
    let observer = Arc::new(ConsoleObserver { sink: Arc::clone(&sink) });

    let harness = BenchmarkHarness::with_current_exe(sink.clone(), observer)?;
    let result = harness.start_benchmark(base, moves, interval).await;
    sink.finish();
    result
}

/// Final summary text for a finished run
pub fn summary_text(report: &BenchmarkReport) -> String {
    match (&report.threads, &report.processes, &report.comparison) {
        (Some(threads), Some(processes), Some(comparison)) => {
            render_summary(threads, processes, comparison)
        }
        _ => {
            let mut out = String::from("Benchmark incomplete:\n");
            for failure in &report.failures {
                out.push_str(&format!("  - {}\n", failure));
            }
            out
        }
    }
}

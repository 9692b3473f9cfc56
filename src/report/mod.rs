//! Comparison and reporting
//!
//! Decides which mode won and renders the final summary. The decision uses a
//! strict less-than on the thread duration, so an exact tie goes to the
//! process mode.

pub mod collector;

pub use collector::ResultCollector;

use crate::models::{ComparisonResult, ExecutionMode, ExecutionSummary};
use crate::util::units::format_seconds;

/// Decide the faster mode and the margin between the two runs
pub fn compare(threads: &ExecutionSummary, processes: &ExecutionSummary) -> ComparisonResult {
    let faster = if threads.duration_seconds < processes.duration_seconds {
        ExecutionMode::Threads
    } else {
        ExecutionMode::Processes
    };

    ComparisonResult {
        faster,
        margin: (threads.duration_seconds - processes.duration_seconds).abs(),
    }
}

/// Reasons usually behind a win of `mode`
pub fn explanation(mode: ExecutionMode) -> &'static [&'static str] {
    match mode {
        ExecutionMode::Threads => &[
            "share memory directly",
            "light, cheap operations",
            "less creation overhead",
            "suited to I/O-bound and simple tasks",
        ],
        ExecutionMode::Processes => &[
            "truly parallel execution",
            "benefit on CPU-intensive work",
            "no shared state to contend on",
        ],
    }
}

/// Render the final summary shown once both modes completed
pub fn render_summary(
    threads: &ExecutionSummary,
    processes: &ExecutionSummary,
    result: &ComparisonResult,
) -> String {
    let mut out = String::new();
    out.push_str("===== FINAL SUMMARY =====\n");
    out.push_str(&format!("Total time (Threads): {}\n", format_seconds(threads.duration_seconds)));
    out.push_str(&format!("Total time (Processes): {}\n", format_seconds(processes.duration_seconds)));
    out.push_str(&format!(
        "Faster: {} by {}\n",
        result.faster,
        format_seconds(result.margin)
    ));
    out.push_str(&format!("{} were faster because they:\n", result.faster.description().to_uppercase()));
    for reason in explanation(result.faster) {
        out.push_str(&format!("  - {}\n", reason));
    }
    out
}

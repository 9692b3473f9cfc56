//! Data models module
//!
//! Contains execution summaries, the comparison between modes, and the
//! report of a complete benchmark run.

pub mod result;

// Re-export commonly used types
pub use result::{
    BenchmarkReport,
    ComparisonResult,
    ExecutionMode,
    ExecutionSummary,
};

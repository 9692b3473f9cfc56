//! Benchmark engine module
//!
//! Contains the two execution modes, the process worker entry point and the
//! message format between process workers and their coordinator.

pub mod message;
pub mod process;
pub mod sink;
pub mod threads;
pub mod worker;

// Re-export commonly used types
pub use message::{MessageKind, ProgressMessage};
pub use process::{Coordinator, CoordinatorExit, LivenessProbe, PollOutcome, ProcessExecutionMode, WorkerCommand};
pub use sink::{ConsoleSink, LogSink, MemorySink, ModeObserver, NoopObserver};
pub use threads::ThreadExecutionMode;
pub use worker::{run_worker, WorkerArgs};

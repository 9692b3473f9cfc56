use chessbench::bench::process::{ProcessExecutionMode, WorkerCommand};
use chessbench::bench::sink::{MemorySink, ModeObserver};
use chessbench::config::BenchmarkConfig;
use chessbench::harness::BenchmarkHarness;
use chessbench::models::{ComparisonResult, ExecutionMode};
use chessbench::ChessBenchError;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingObserver {
    completed: Mutex<Vec<(ExecutionMode, f64)>>,
    comparisons: Mutex<Vec<ComparisonResult>>,
}

impl ModeObserver for RecordingObserver {
    fn on_mode_complete(&self, mode: ExecutionMode, duration_seconds: f64) {
        self.completed.lock().unwrap().push((mode, duration_seconds));
    }

    fn on_comparison(&self, result: &ComparisonResult) {
        self.comparisons.lock().unwrap().push(*result);
    }
}

fn harness(sink: Arc<MemorySink>, observer: Arc<RecordingObserver>) -> BenchmarkHarness {
    BenchmarkHarness::new(
        sink,
        observer,
        ProcessExecutionMode::new(WorkerCommand::binary(env!("CARGO_BIN_EXE_chessbench"))),
    )
}

fn base_config() -> BenchmarkConfig {
    BenchmarkConfig::new().with_buffer_size(2_000).with_seed(Some(7))
}

#[tokio::test]
async fn test_full_run_compares_once() {
    let sink = Arc::new(MemorySink::new());
    let observer = Arc::new(RecordingObserver::default());

    let report = harness(sink.clone(), observer.clone())
        .start_benchmark(base_config(), "2", "10")
        .await
        .expect("benchmark should complete");

    assert!(report.is_complete());
    assert!(report.failures.is_empty());

    let completed = observer.completed.lock().unwrap().clone();
    assert_eq!(completed.len(), 2);
    assert!(completed.iter().any(|(m, _)| *m == ExecutionMode::Threads));
    assert!(completed.iter().any(|(m, _)| *m == ExecutionMode::Processes));

    let comparisons = observer.comparisons.lock().unwrap().clone();
    assert_eq!(comparisons.len(), 1);
    assert_eq!(Some(comparisons[0]), report.comparison);

    let threads = report.threads.as_ref().unwrap();
    let processes = report.processes.as_ref().unwrap();
    let expected_margin = (threads.duration_seconds - processes.duration_seconds).abs();
    assert!((comparisons[0].margin - expected_margin).abs() < 1e-9);

    assert_eq!(sink.lines()[0], "Configuration: 2 moves, 10ms interval, buffer: 2000");
    assert_eq!(sink.lines_with_prefix("=== STARTING THREADS ===").len(), 1);
    assert_eq!(sink.lines_with_prefix("=== STARTING PROCESSES ===").len(), 1);
    assert_eq!(sink.lines_with_prefix("Thread ").len(), 2 * 2 + 2);
    assert_eq!(sink.lines_with_prefix("Process ").len(), 2 * 2 + 2);
}

#[tokio::test]
async fn test_negative_interval_is_rejected() {
    let sink = Arc::new(MemorySink::new());
    let observer = Arc::new(RecordingObserver::default());

    let result = harness(sink.clone(), observer.clone())
        .start_benchmark(base_config(), "3", "-5")
        .await;

    assert!(matches!(result, Err(ChessBenchError::Validation(_))));
    assert!(sink.is_empty());
    assert!(observer.completed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_report_serializes_to_json() {
    let sink = Arc::new(MemorySink::new());
    let observer = Arc::new(RecordingObserver::default());

    let report = harness(sink, observer)
        .start_benchmark(base_config(), "1", "0")
        .await
        .expect("benchmark should complete");

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["threads"]["mode"], "threads");
    assert_eq!(json["processes"]["mode"], "processes");
    assert_eq!(json["config"]["moves_per_worker"], 1);
}

//! Shared-memory execution mode
//!
//! Two OS threads play against one [`SharedBoard`]. They read the light
//! workload buffer without synchronisation (nobody writes it) and serialise
//! their board mutations through the board's lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use crate::bench::sink::LogSink;
use crate::board::{RandomPolicy, SharedBoard, SharedResource};
use crate::config::BenchmarkConfig;
use crate::models::{ExecutionMode, ExecutionSummary};
use crate::util::units::format_duration;
use crate::workload::LightWorkload;
use crate::{ChessBenchError, Result, PLAYER_COUNT};

const MODE: ExecutionMode = ExecutionMode::Threads;

/// Everything one thread worker needs, moved into its thread
struct ThreadPlayer {
    worker_id: u32,
    moves: u32,
    interval: Duration,
    workload: LightWorkload,
    board: SharedBoard,
    sink: Arc<dyn LogSink>,
    stop: Arc<AtomicBool>,
}

impl ThreadPlayer {
    /// Play every move, returning how many were applied
    fn play(self) -> Result<u64> {
        for sequence in 1..=self.moves {
            if self.stop.load(Ordering::Relaxed) {
                // the failing sibling reports the error
                debug!(worker_id = self.worker_id, sequence, "stopping after sibling failure");
                return Ok(sequence as u64 - 1);
            }

            let unit = self.workload.run();
            std::hint::black_box(unit.cost);

            thread::sleep(self.interval);

            if let Err(e) = self.board.mutate() {
                self.stop.store(true, Ordering::Relaxed);
                return Err(e);
            }
            self.sink.log(&MODE.move_line(self.worker_id, sequence));
        }

        self.sink.log(&MODE.completion_line(self.worker_id));
        Ok(self.moves as u64)
    }
}

/// Runs both players as threads sharing one board
pub struct ThreadExecutionMode;

impl ThreadExecutionMode {
    /// Run on a fresh board seeded from the configuration
    pub async fn run(config: &BenchmarkConfig, sink: Arc<dyn LogSink>) -> Result<ExecutionSummary> {
        let resource = SharedResource::new(RandomPolicy::from_seed_option(config.seed));
        Self::run_on(config, sink, SharedBoard::new(resource)).await
    }

    /// Run on the given board.
    ///
    /// Waits for both players. The first failing player aborts the mode: the
    /// other player stops at its next move, the first error is returned once
    /// both have ended and no summary is produced.
    pub async fn run_on(
        config: &BenchmarkConfig,
        sink: Arc<dyn LogSink>,
        board: SharedBoard,
    ) -> Result<ExecutionSummary> {
        config.validate()?;

        let workload = LightWorkload::new(config.buffer_size);
        let stop = Arc::new(AtomicBool::new(false));
        let mut players = JoinSet::new();

        info!(moves = config.moves_per_worker, interval_ms = config.interval_millis, "starting thread mode");
        let start = Instant::now();

        for worker_id in 1..=PLAYER_COUNT {
            let player = ThreadPlayer {
                worker_id,
                moves: config.moves_per_worker,
                interval: config.thread_interval(),
                workload: workload.clone(),
                board: board.clone(),
                sink: Arc::clone(&sink),
                stop: Arc::clone(&stop),
            };
            players.spawn_blocking(move || player.play());
        }

        let mut moves_applied = 0u64;
        let mut failure = None;
        // keep joining after a failure so no player outlives the mode
        while let Some(joined) = players.join_next().await {
            let outcome = joined
                .map_err(|e| ChessBenchError::Worker(format!("Thread worker join failed: {}", e)))
                .and_then(|played| played);
            match outcome {
                Ok(applied) => moves_applied += applied,
                Err(e) => {
                    stop.store(true, Ordering::Relaxed);
                    if failure.is_none() {
                        warn!(error = %e, "thread worker failed, aborting mode");
                        failure = Some(e);
                    }
                }
            }
        }
        if let Some(e) = failure {
            return Err(e);
        }

        let elapsed = start.elapsed();
        debug!(elapsed = %format_duration(elapsed), moves_applied, "thread mode finished");
        Ok(ExecutionSummary::new(MODE, elapsed, moves_applied))
    }
}

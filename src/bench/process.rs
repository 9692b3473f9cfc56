//! Isolated-process execution mode
//!
//! Two child processes play without access to the board. Each reports its
//! moves as JSON lines on stdout; forwarding tasks decode them into one bounded
//! channel, and a single coordinator applies every move to the board. Being
//! the only writer, the coordinator needs no lock.
//!
//! The coordinator never blocks indefinitely: it receives with a timeout and,
//! whenever the timeout elapses, checks whether any worker is still alive. If
//! none is, it reads what the workers wrote before exiting, for a bounded
//! time, and then stops even when a DONE message never arrived.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use crate::bench::message::{MessageKind, ProgressMessage};
use crate::bench::sink::LogSink;
use crate::bench::worker::WorkerArgs;
use crate::board::{RandomPolicy, SharedResource};
use crate::config::BenchmarkConfig;
use crate::models::{ExecutionMode, ExecutionSummary};
use crate::util::units::format_duration;
use crate::{ChessBenchError, Result, PLAYER_COUNT, WORKER_SUBCOMMAND};

const MODE: ExecutionMode = ExecutionMode::Processes;

/// Upper bound on reading leftover output once no worker is alive; a
/// grandchild holding a pipe open must not stall the coordinator
const DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Result of one bounded receive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// A message arrived in time
    Received(ProgressMessage),
    /// Nothing arrived within the timeout
    Timeout,
    /// Every producer is gone and the channel is drained
    Closed,
}

/// Wait at most `timeout` for the next message
pub async fn receive_with_timeout(
    rx: &mut mpsc::Receiver<ProgressMessage>,
    timeout: Duration,
) -> PollOutcome {
    match tokio::time::timeout(timeout, rx.recv()).await {
        Ok(Some(message)) => PollOutcome::Received(message),
        Ok(None) => PollOutcome::Closed,
        Err(_) => PollOutcome::Timeout,
    }
}

/// Tells the coordinator whether any worker can still send messages
pub trait LivenessProbe {
    fn any_alive(&mut self) -> bool;
}

/// Why the coordinator loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorExit {
    /// Every worker reported DONE
    AllDone,
    /// A poll timed out and no worker was alive anymore
    LivenessFallback,
    /// All forwarders ended before every DONE arrived
    ChannelClosed,
}

/// What the coordinator observed during one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorStats {
    pub moves_applied: u64,
    /// Workers that reported DONE
    pub finished: BTreeSet<u32>,
    /// Poll cycles that timed out
    pub idle_polls: u32,
    pub exit: CoordinatorExit,
}

/// Single owner and writer of the board in process mode
pub struct Coordinator {
    resource: SharedResource,
    sink: Arc<dyn LogSink>,
    poll_timeout: Duration,
    workers: u32,
}

impl Coordinator {
    pub fn new(resource: SharedResource, sink: Arc<dyn LogSink>, poll_timeout: Duration) -> Self {
        Self {
            resource,
            sink,
            poll_timeout,
            workers: PLAYER_COUNT,
        }
    }

    /// Consume messages until every worker reported DONE, the channel closed,
    /// or a timed-out poll found no live worker.
    pub async fn drive<P: LivenessProbe>(
        &mut self,
        rx: &mut mpsc::Receiver<ProgressMessage>,
        probe: &mut P,
    ) -> Result<CoordinatorStats> {
        let mut stats = CoordinatorStats {
            moves_applied: 0,
            finished: BTreeSet::new(),
            idle_polls: 0,
            exit: CoordinatorExit::AllDone,
        };

        while (stats.finished.len() as u32) < self.workers {
            match receive_with_timeout(rx, self.poll_timeout).await {
                PollOutcome::Received(message) => self.apply(message, &mut stats)?,
                PollOutcome::Timeout => {
                    stats.idle_polls += 1;
                    if !probe.any_alive() {
                        self.drain_after_exit(rx, &mut stats).await?;
                        if (stats.finished.len() as u32) < self.workers {
                            warn!(finished = stats.finished.len(), "no worker alive, stopping without every DONE");
                            stats.exit = CoordinatorExit::LivenessFallback;
                        }
                        break;
                    }
                }
                PollOutcome::Closed => {
                    warn!(finished = stats.finished.len(), "worker channel closed before every DONE");
                    stats.exit = CoordinatorExit::ChannelClosed;
                    break;
                }
            }
        }

        Ok(stats)
    }

    /// Every worker has exited: take what they wrote before exiting until
    /// the forwarders reach EOF, every DONE arrived or [`DRAIN_GRACE`] ran out.
    async fn drain_after_exit(
        &mut self,
        rx: &mut mpsc::Receiver<ProgressMessage>,
        stats: &mut CoordinatorStats,
    ) -> Result<()> {
        let deadline = Instant::now() + DRAIN_GRACE;
        while (stats.finished.len() as u32) < self.workers {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                debug!("drain grace elapsed with the channel still open");
                break;
            }
            match receive_with_timeout(rx, remaining).await {
                PollOutcome::Received(message) => self.apply(message, stats)?,
                PollOutcome::Timeout | PollOutcome::Closed => break,
            }
        }
        Ok(())
    }

    fn apply(&mut self, message: ProgressMessage, stats: &mut CoordinatorStats) -> Result<()> {
        if message.worker_id == 0 || message.worker_id > self.workers {
            warn!(worker_id = message.worker_id, "ignoring message from unknown worker");
            return Ok(());
        }

        match message.kind {
            MessageKind::Move => {
                self.resource.mutate()?;
                stats.moves_applied += 1;
                self.sink.log(&MODE.move_line(message.worker_id, message.sequence));
            }
            MessageKind::Done => {
                if stats.finished.insert(message.worker_id) {
                    self.sink.log(&MODE.completion_line(message.worker_id));
                } else {
                    warn!(worker_id = message.worker_id, "duplicate DONE ignored");
                }
            }
        }
        Ok(())
    }

    pub fn resource(&self) -> &SharedResource {
        &self.resource
    }

    pub fn into_resource(self) -> SharedResource {
        self.resource
    }
}

/// How worker processes are launched
#[derive(Debug, Clone)]
pub struct WorkerCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl WorkerCommand {
    /// Launch `program` with `args` followed by the worker arguments
    pub fn new(program: impl Into<PathBuf>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Re-execute the running binary with the worker subcommand
    pub fn current_exe() -> Result<Self> {
        let program = std::env::current_exe()
            .map_err(|e| ChessBenchError::Worker(format!("Cannot locate current executable: {}", e)))?;
        Ok(Self::new(program, [WORKER_SUBCOMMAND]))
    }

    /// Use `program`'s worker subcommand
    pub fn binary(program: impl Into<PathBuf>) -> Self {
        Self::new(program, [WORKER_SUBCOMMAND])
    }

    fn spawn(&self, worker: &WorkerArgs) -> Result<Child> {
        Command::new(&self.program)
            .args(&self.args)
            .args(worker.to_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ChessBenchError::Worker(format!(
                    "Failed to spawn worker {} ({}): {}",
                    worker.player,
                    self.program.display(),
                    e
                ))
            })
    }
}

/// Running worker processes, probed through `try_wait`
struct WorkerProcesses {
    children: Vec<(u32, Child)>,
}

impl LivenessProbe for WorkerProcesses {
    fn any_alive(&mut self) -> bool {
        self.children
            .iter_mut()
            .any(|(_, child)| matches!(child.try_wait(), Ok(None)))
    }
}

impl WorkerProcesses {
    /// Wait for every child to exit
    async fn wait_all(&mut self) -> Result<()> {
        for (player, child) in &mut self.children {
            let status = child.wait().await?;
            if !status.success() {
                warn!(player = *player, %status, "worker process exited with failure");
            }
        }
        Ok(())
    }

    /// Kill every child that is still running
    async fn kill_all(&mut self) {
        for (player, child) in &mut self.children {
            if let Err(e) = child.kill().await {
                debug!(player = *player, error = %e, "kill failed, worker already gone");
            }
        }
    }
}

/// Decode one worker's stdout into the shared channel until EOF
fn forward_messages(player: u32, stdout: ChildStdout, tx: mpsc::Sender<ProgressMessage>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match ProgressMessage::from_line(&line) {
                    Ok(message) => {
                        if tx.send(message).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(player, error = %e, "skipping undecodable worker line"),
                },
                Ok(None) => break,
                Err(e) => {
                    warn!(player, error = %e, "worker stdout read failed");
                    break;
                }
            }
        }
        debug!(player, "forwarder finished");
    });
}

/// Runs both players as child processes relaying moves to a coordinator
#[derive(Debug, Clone)]
pub struct ProcessExecutionMode {
    command: WorkerCommand,
}

impl ProcessExecutionMode {
    pub fn new(command: WorkerCommand) -> Self {
        Self { command }
    }

    /// Workers re-execute the running binary
    pub fn from_current_exe() -> Result<Self> {
        Ok(Self::new(WorkerCommand::current_exe()?))
    }

    /// Run on a fresh board seeded from the configuration
    pub async fn run(&self, config: &BenchmarkConfig, sink: Arc<dyn LogSink>) -> Result<ExecutionSummary> {
        let resource = SharedResource::new(RandomPolicy::from_seed_option(config.seed));
        let (summary, _) = self.run_with_resource(config, sink, resource).await?;
        Ok(summary)
    }

    /// Run on the given board and hand it back afterwards
    pub async fn run_with_resource(
        &self,
        config: &BenchmarkConfig,
        sink: Arc<dyn LogSink>,
        resource: SharedResource,
    ) -> Result<(ExecutionSummary, SharedResource)> {
        config.validate()?;

        let (tx, mut rx) = mpsc::channel(config.channel_capacity);
        let mut processes = WorkerProcesses { children: Vec::new() };

        info!(moves = config.moves_per_worker, interval_ms = config.interval_millis, "starting process mode");
        let start = Instant::now();

        for player in 1..=PLAYER_COUNT {
            let mut child = self.command.spawn(&WorkerArgs::from_config(player, config))?;
            let stdout = child.stdout.take().ok_or_else(|| {
                ChessBenchError::Worker(format!("Worker {} has no stdout pipe", player))
            })?;
            forward_messages(player, stdout, tx.clone());
            processes.children.push((player, child));
        }
        // the channel closes once every forwarder is done
        drop(tx);

        let mut coordinator = Coordinator::new(resource, sink, config.poll_timeout);
        let stats = match coordinator.drive(&mut rx, &mut processes).await {
            Ok(stats) => stats,
            Err(e) => {
                warn!(error = %e, "coordinator failed, killing workers");
                processes.kill_all().await;
                return Err(e);
            }
        };

        processes.wait_all().await?;
        let elapsed = start.elapsed();
        debug!(elapsed = %format_duration(elapsed), ?stats, "process mode finished");

        let summary = ExecutionSummary::new(MODE, elapsed, stats.moves_applied)
            .with_liveness_fallback(stats.exit != CoordinatorExit::AllDone);
        Ok((summary, coordinator.into_resource()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::sink::MemorySink;
    use crate::board::{Board, SelectionPolicy};

    /// Reports the workers alive for a fixed number of probes
    struct ScriptedProbe {
        alive_for: u32,
        probes: u32,
    }

    impl LivenessProbe for ScriptedProbe {
        fn any_alive(&mut self) -> bool {
            self.probes += 1;
            self.probes <= self.alive_for
        }
    }

    fn coordinator(sink: Arc<MemorySink>) -> Coordinator {
        Coordinator::new(
            SharedResource::new(RandomPolicy::seeded(3)),
            sink,
            Duration::from_millis(20),
        )
    }

    #[tokio::test]
    async fn test_receive_with_timeout_outcomes() {
        let (tx, mut rx) = mpsc::channel(4);
        assert_eq!(
            receive_with_timeout(&mut rx, Duration::from_millis(10)).await,
            PollOutcome::Timeout
        );

        tx.send(ProgressMessage::moved(1, 1)).await.unwrap();
        assert_eq!(
            receive_with_timeout(&mut rx, Duration::from_millis(10)).await,
            PollOutcome::Received(ProgressMessage::moved(1, 1))
        );

        drop(tx);
        assert_eq!(
            receive_with_timeout(&mut rx, Duration::from_millis(10)).await,
            PollOutcome::Closed
        );
    }

    #[tokio::test]
    async fn test_applies_one_mutation_per_move() {
        let sink = Arc::new(MemorySink::new());
        let mut coordinator = coordinator(sink.clone());
        let (tx, mut rx) = mpsc::channel(16);

        for player in 1..=2 {
            for n in 1..=3 {
                tx.send(ProgressMessage::moved(player, n)).await.unwrap();
            }
            tx.send(ProgressMessage::done(player, 3)).await.unwrap();
        }

        let mut probe = ScriptedProbe { alive_for: u32::MAX, probes: 0 };
        let stats = coordinator.drive(&mut rx, &mut probe).await.unwrap();

        assert_eq!(stats.exit, CoordinatorExit::AllDone);
        assert_eq!(stats.moves_applied, 6);
        assert_eq!(stats.finished.len(), 2);
        assert_eq!(sink.len(), 8);
        assert_eq!(coordinator.resource().occupied_count(), 32);
        // both DONEs arrived, the probe was never needed
        assert_eq!(probe.probes, 0);
    }

    #[tokio::test]
    async fn test_liveness_fallback_on_lost_done() {
        let sink = Arc::new(MemorySink::new());
        let mut coordinator = coordinator(sink.clone());
        let (tx, mut rx) = mpsc::channel(16);

        tx.send(ProgressMessage::moved(1, 1)).await.unwrap();
        tx.send(ProgressMessage::done(1, 1)).await.unwrap();
        tx.send(ProgressMessage::moved(2, 1)).await.unwrap();
        // worker 2's DONE is lost; the sender stays open so the channel never closes

        let mut probe = ScriptedProbe { alive_for: 2, probes: 0 };
        let stats = tokio::time::timeout(Duration::from_secs(5), coordinator.drive(&mut rx, &mut probe))
            .await
            .expect("coordinator must not block forever")
            .unwrap();

        assert_eq!(stats.exit, CoordinatorExit::LivenessFallback);
        assert_eq!(stats.idle_polls, 3);
        assert_eq!(stats.moves_applied, 2);
        assert_eq!(stats.finished.iter().copied().collect::<Vec<_>>(), vec![1]);
        drop(tx);
    }

    #[tokio::test]
    async fn test_channel_closed_ends_loop() {
        let sink = Arc::new(MemorySink::new());
        let mut coordinator = coordinator(sink.clone());
        let (tx, mut rx) = mpsc::channel(16);
        tx.send(ProgressMessage::done(1, 0)).await.unwrap();
        drop(tx);

        let mut probe = ScriptedProbe { alive_for: u32::MAX, probes: 0 };
        let stats = coordinator.drive(&mut rx, &mut probe).await.unwrap();
        assert_eq!(stats.exit, CoordinatorExit::ChannelClosed);
        assert_eq!(sink.lines(), vec!["Process 1 finished its moves".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_and_unknown_messages() {
        let sink = Arc::new(MemorySink::new());
        let mut coordinator = coordinator(sink.clone());
        let (tx, mut rx) = mpsc::channel(16);
        tx.send(ProgressMessage::moved(7, 1)).await.unwrap();
        tx.send(ProgressMessage::done(1, 0)).await.unwrap();
        tx.send(ProgressMessage::done(1, 0)).await.unwrap();
        tx.send(ProgressMessage::done(2, 0)).await.unwrap();

        let mut probe = ScriptedProbe { alive_for: u32::MAX, probes: 0 };
        let stats = coordinator.drive(&mut rx, &mut probe).await.unwrap();
        assert_eq!(stats.exit, CoordinatorExit::AllDone);
        assert_eq!(stats.moves_applied, 0);
        assert_eq!(sink.len(), 2);
    }

    struct FirstPolicy;

    impl SelectionPolicy for FirstPolicy {
        fn pick(&mut self, _len: usize) -> usize {
            0
        }
    }

    #[tokio::test]
    async fn test_precondition_failure_propagates() {
        let sink = Arc::new(MemorySink::new());
        let mut coordinator = Coordinator::new(
            SharedResource::with_board(Board::empty(), FirstPolicy),
            sink.clone(),
            Duration::from_millis(20),
        );
        let (tx, mut rx) = mpsc::channel(4);
        tx.send(ProgressMessage::moved(1, 1)).await.unwrap();

        let mut probe = ScriptedProbe { alive_for: u32::MAX, probes: 0 };
        let result = coordinator.drive(&mut rx, &mut probe).await;
        assert!(matches!(result, Err(ChessBenchError::Precondition(_))));
        assert!(sink.is_empty());
    }

    #[cfg(unix)]
    fn shell_worker(script: &str) -> ProcessExecutionMode {
        // sh -c <script> --player <id> ...: $0 is "--player", $1 the player id
        ProcessExecutionMode::new(WorkerCommand::new("sh", ["-c", script]))
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_workers_complete() {
        let mode = shell_worker(
            r#"echo "{\"worker_id\":$1,\"kind\":\"MOVE\",\"sequence\":1}"; echo "{\"worker_id\":$1,\"kind\":\"DONE\",\"sequence\":1}""#,
        );
        let sink = Arc::new(MemorySink::new());
        let config = BenchmarkConfig::new().with_moves_per_worker(1).with_seed(Some(4));
        let (summary, resource) = mode
            .run_with_resource(&config, sink.clone(), SharedResource::new(RandomPolicy::seeded(4)))
            .await
            .unwrap();

        assert_eq!(summary.mode, ExecutionMode::Processes);
        assert_eq!(summary.moves_applied, 2);
        assert!(!summary.liveness_fallback);
        assert_eq!(resource.occupied_count(), 32);
        assert_eq!(sink.len(), 4);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_workers_exit_without_done() {
        let mode = shell_worker(r#"echo "{\"worker_id\":$1,\"kind\":\"MOVE\",\"sequence\":1}"; echo garbage"#);
        let sink = Arc::new(MemorySink::new());
        let config = BenchmarkConfig::new().with_poll_timeout(Duration::from_millis(20));

        let summary = tokio::time::timeout(Duration::from_secs(10), mode.run(&config, sink.clone()))
            .await
            .expect("process mode must terminate")
            .unwrap();

        assert!(summary.liveness_fallback);
        assert_eq!(summary.moves_applied, 2);
        assert!(sink.lines_with_prefix("Process").iter().all(|l| l.contains("made move")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_output_of_exited_workers_is_still_applied() {
        let mode = shell_worker(
            r#"sleep 0.02; echo "{\"worker_id\":$1,\"kind\":\"MOVE\",\"sequence\":1}"; echo "{\"worker_id\":$1,\"kind\":\"DONE\",\"sequence\":1}""#,
        );
        let config = BenchmarkConfig::new()
            .with_moves_per_worker(1)
            .with_poll_timeout(Duration::from_micros(200));

        for _ in 0..10 {
            let sink = Arc::new(MemorySink::new());
            let summary = mode.run(&config, sink.clone()).await.unwrap();

            assert_eq!(summary.moves_applied, 2);
            assert!(!summary.liveness_fallback);
            assert_eq!(sink.len(), 4);
        }
    }

    #[tokio::test]
    async fn test_drain_picks_up_queued_done_after_exit() {
        let sink = Arc::new(MemorySink::new());
        let mut coordinator = coordinator(sink.clone());
        let (tx, mut rx) = mpsc::channel(16);

        let late = tx.clone();
        tokio::spawn(async move {
            // arrives after the probe already reported every worker dead
            tokio::time::sleep(Duration::from_millis(60)).await;
            late.send(ProgressMessage::done(1, 0)).await.unwrap();
            late.send(ProgressMessage::done(2, 0)).await.unwrap();
        });
        drop(tx);

        let mut probe = ScriptedProbe { alive_for: 0, probes: 0 };
        let stats = coordinator.drive(&mut rx, &mut probe).await.unwrap();
        assert_eq!(stats.exit, CoordinatorExit::AllDone);
        assert_eq!(stats.finished.len(), 2);
        assert_eq!(stats.idle_polls, 1);
    }

    #[tokio::test]
    async fn test_spawn_failure_is_worker_error() {
        let mode = ProcessExecutionMode::new(WorkerCommand::binary("/nonexistent/chessbench-worker"));
        let sink = Arc::new(MemorySink::new());
        match mode.run(&BenchmarkConfig::new(), sink).await {
            Err(ChessBenchError::Worker(msg)) => assert!(msg.contains("Failed to spawn worker 1")),
            other => panic!("expected worker error, got {:?}", other),
        }
    }
}

//! Process worker entry point
//!
//! A process worker never sees the board. It runs the heavy workload, sleeps
//! half the configured interval and reports each move as a
//! [`ProgressMessage`] line on stdout; the coordinator applies the moves.

use std::io::Write;
use std::thread;
use tracing::debug;
use crate::bench::message::ProgressMessage;
use crate::config::BenchmarkConfig;
use crate::workload::HeavyWorkload;
use crate::Result;

/// Arguments a process worker is started with
#[derive(Debug, Clone, PartialEq, Eq, clap::Args)]
pub struct WorkerArgs {
    /// Player id reported in every message
    #[arg(long)]
    pub player: u32,
    /// Number of moves to make
    #[arg(long)]
    pub moves: u32,
    /// Thread-mode interval; the worker sleeps half of it
    #[arg(long)]
    pub interval_ms: u64,
    /// Light buffer size the heavy buffer is scaled from
    #[arg(long)]
    pub buffer_size: usize,
    /// Heavy buffer multiplier
    #[arg(long)]
    pub scale: usize,
    /// Seed for the heavy buffers
    #[arg(long)]
    pub seed: Option<u64>,
}

impl WorkerArgs {
    /// Arguments for player `player` of a run using `config`
    pub fn from_config(player: u32, config: &BenchmarkConfig) -> Self {
        Self {
            player,
            moves: config.moves_per_worker,
            interval_ms: config.interval_millis,
            buffer_size: config.buffer_size,
            scale: config.heavy_scale_factor,
            // each player gets its own stream
            seed: config.seed.map(|s| s.wrapping_add(player as u64)),
        }
    }

    /// Render as command-line arguments for the worker subcommand
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "--player".to_string(),
            self.player.to_string(),
            "--moves".to_string(),
            self.moves.to_string(),
            "--interval-ms".to_string(),
            self.interval_ms.to_string(),
            "--buffer-size".to_string(),
            self.buffer_size.to_string(),
            "--scale".to_string(),
            self.scale.to_string(),
        ];
        if let Some(seed) = self.seed {
            args.push("--seed".to_string());
            args.push(seed.to_string());
        }
        args
    }

    /// Configuration view of these arguments
    pub fn config(&self) -> BenchmarkConfig {
        BenchmarkConfig::new()
            .with_moves_per_worker(self.moves)
            .with_interval_millis(self.interval_ms)
            .with_buffer_size(self.buffer_size)
            .with_heavy_scale_factor(self.scale)
            .with_seed(self.seed)
    }
}

/// Play every move, writing one message per move and a final DONE
pub fn run_worker<W: Write>(args: &WorkerArgs, out: &mut W) -> Result<()> {
    let config = args.config();
    config.validate()?;

    let mut workload = HeavyWorkload::new(config.heavy_buffer_size(), args.seed);
    let interval = config.process_interval();

    for sequence in 1..=args.moves {
        let unit = workload.run();
        std::hint::black_box(unit.cost);
        debug!(player = args.player, sequence, elapsed = ?unit.elapsed, "heavy workload done");

        thread::sleep(interval);
        ProgressMessage::moved(args.player, sequence).write_line(out)?;
    }

    ProgressMessage::done(args.player, args.moves).write_line(out)
}

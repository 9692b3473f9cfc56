use std::path::PathBuf;
use std::time::Duration;

use chessbench::bench::worker::{run_worker, WorkerArgs};
use chessbench::config::BenchmarkConfig;
use chessbench::simple::{ask_inputs, run_console, summary_text};
use chessbench::util::units::parse_duration;
use chessbench::{error, ChessBenchError, Result};
use clap::{Args, Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chessbench")]
#[command(about = "Compare threads and processes playing random moves on a shared chess board")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the benchmark (prompts for moves and interval when not given)
    Run(RunArgs),
    /// Play as one process worker, reporting moves on stdout
    #[command(hide = true)]
    Worker(WorkerArgs),
}

#[derive(Args, Default)]
struct RunArgs {
    /// Moves per player
    #[arg(short, long)]
    moves: Option<String>,
    /// Interval between moves in milliseconds
    #[arg(short, long)]
    interval_ms: Option<String>,
    /// Element count of the light workload buffer
    #[arg(long)]
    buffer_size: Option<usize>,
    /// Seed for board moves and heavy buffers
    #[arg(long)]
    seed: Option<u64>,
    /// Coordinator poll timeout, e.g. "100ms"
    #[arg(long, value_parser = parse_duration)]
    poll_timeout: Option<Duration>,
    /// Configuration file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Save the effective configuration before running
    #[arg(long)]
    save_config: bool,
    /// Print the report as JSON instead of the text summary
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Worker(args) => {
            let stdout = std::io::stdout();
            run_worker(&args, &mut stdout.lock())
        }
        Commands::Run(args) => run(args).await,
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => BenchmarkConfig::load_from(path)?,
        None => BenchmarkConfig::load()?,
    };
    if let Some(size) = args.buffer_size {
        config = config.with_buffer_size(size);
    }
    if let Some(timeout) = args.poll_timeout {
        config = config.with_poll_timeout(timeout);
    }
    if args.seed.is_some() {
        config = config.with_seed(args.seed);
    }

    let (moves, interval) = match (args.moves, args.interval_ms) {
        (None, None) => ask_inputs()?,
        (moves, interval) => (
            moves.unwrap_or_else(|| config.moves_per_worker.to_string()),
            interval.unwrap_or_else(|| config.interval_millis.to_string()),
        ),
    };

    if args.save_config {
        let effective = config.clone().with_inputs(&moves, &interval);
        match (effective, &args.config) {
            (Ok(effective), Some(path)) => effective.save_to(path)?,
            (Ok(effective), None) => effective.save()?,
            (Err(_), _) => {}
        }
    }

    let report = match run_console(config, &moves, &interval).await {
        Ok(report) => report,
        Err(e @ ChessBenchError::Validation(_)) => {
            eprintln!("{}", error::user_friendly_message(&e));
            std::process::exit(2);
        }
        Err(e) => {
            error!(error = %e, "benchmark failed");
            eprintln!("{}", error::user_friendly_message(&e));
            std::process::exit(1);
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", summary_text(&report));
    }
    Ok(())
}

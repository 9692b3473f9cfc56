//! Configuration management module
//!
//! Handles parsing of raw user input, validation, and loading/saving of the
//! benchmark configuration as TOML.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::{ChessBenchError, Result, APP_NAME, CONFIG_FILE};

/// Buffer size used when none is configured
pub const DEFAULT_BUFFER_SIZE: usize = 90_000;
/// Heavy buffers are this many times larger than the light one
pub const DEFAULT_HEAVY_SCALE_FACTOR: usize = 10;
/// Default moves per player offered by the interactive prompt
pub const DEFAULT_MOVES_PER_WORKER: u32 = 10;
/// Default interval between moves offered by the interactive prompt
pub const DEFAULT_INTERVAL_MILLIS: u64 = 100;

const MAX_BUFFER_SIZE: usize = 50_000_000;
const MAX_HEAVY_SCALE_FACTOR: usize = 1_000;
const MAX_MOVES_PER_WORKER: u32 = 1_000_000;

/// Benchmark configuration, immutable once a run starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Moves each of the two players makes
    pub moves_per_worker: u32,
    /// Sleep between moves in thread mode (process mode sleeps half of it)
    pub interval_millis: u64,
    /// Element count of the light workload buffer
    pub buffer_size: usize,
    /// Multiplier applied to `buffer_size` for the heavy workload
    pub heavy_scale_factor: usize,
    /// How long the coordinator waits for a message before checking liveness
    #[serde(with = "humantime_serde")]
    pub poll_timeout: Duration,
    /// Offset between starting the thread mode and the process mode
    #[serde(with = "humantime_serde")]
    pub process_start_delay: Duration,
    /// Capacity of the bounded coordinator channel
    pub channel_capacity: usize,
    /// Seed for board moves and heavy buffers; entropy when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            moves_per_worker: DEFAULT_MOVES_PER_WORKER,
            interval_millis: DEFAULT_INTERVAL_MILLIS,
            buffer_size: DEFAULT_BUFFER_SIZE,
            heavy_scale_factor: DEFAULT_HEAVY_SCALE_FACTOR,
            poll_timeout: Duration::from_millis(100),
            process_start_delay: Duration::from_millis(100),
            channel_capacity: 64,
            seed: None,
        }
    }
}

impl BenchmarkConfig {
    /// Create a new benchmark configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from the two raw values a user types in.
    ///
    /// Both must be non-negative integers; anything else is a
    /// [`ChessBenchError::Validation`].
    pub fn from_inputs(moves: &str, interval_millis: &str) -> Result<Self> {
        Self::default().with_inputs(moves, interval_millis)
    }

    /// Apply raw user input on top of an existing configuration
    pub fn with_inputs(self, moves: &str, interval_millis: &str) -> Result<Self> {
        let moves_per_worker = parse_non_negative::<u32>("moves per player", moves)?;
        let interval_millis = parse_non_negative::<u64>("interval", interval_millis)?;

        let config = Self {
            moves_per_worker,
            interval_millis,
            ..self
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.moves_per_worker > MAX_MOVES_PER_WORKER {
            return Err(ChessBenchError::Validation(format!(
                "Too many moves: {} (max: {})",
                self.moves_per_worker, MAX_MOVES_PER_WORKER
            )));
        }

        if self.buffer_size == 0 {
            return Err(ChessBenchError::Validation(
                "Buffer size must be greater than 0".to_string(),
            ));
        }

        if self.buffer_size > MAX_BUFFER_SIZE {
            return Err(ChessBenchError::Validation(format!(
                "Buffer size too large: {} (max: {})",
                self.buffer_size, MAX_BUFFER_SIZE
            )));
        }

        if self.heavy_scale_factor == 0 || self.heavy_scale_factor > MAX_HEAVY_SCALE_FACTOR {
            return Err(ChessBenchError::Validation(format!(
                "Heavy scale factor must be between 1 and {}",
                MAX_HEAVY_SCALE_FACTOR
            )));
        }

        if self.poll_timeout.is_zero() {
            return Err(ChessBenchError::Validation(
                "Poll timeout must be greater than 0".to_string(),
            ));
        }

        if self.channel_capacity == 0 {
            return Err(ChessBenchError::Validation(
                "Channel capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Sleep between two moves of a thread worker
    pub fn thread_interval(&self) -> Duration {
        Duration::from_millis(self.interval_millis)
    }

    /// Sleep between two moves of a process worker, half the thread interval
    pub fn process_interval(&self) -> Duration {
        Duration::from_micros(self.interval_millis.saturating_mul(500))
    }

    /// Element count of one heavy workload buffer
    pub fn heavy_buffer_size(&self) -> usize {
        self.buffer_size.saturating_mul(self.heavy_scale_factor)
    }

    /// Set the number of moves per player
    pub fn with_moves_per_worker(mut self, moves: u32) -> Self {
        self.moves_per_worker = moves;
        self
    }

    /// Set the interval between moves
    pub fn with_interval_millis(mut self, interval: u64) -> Self {
        self.interval_millis = interval;
        self
    }

    /// Set the light buffer size
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Set the heavy buffer multiplier
    pub fn with_heavy_scale_factor(mut self, factor: usize) -> Self {
        self.heavy_scale_factor = factor;
        self
    }

    /// Set the coordinator poll timeout
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Set the delay before the process mode starts
    pub fn with_process_start_delay(mut self, delay: Duration) -> Self {
        self.process_start_delay = delay;
        self
    }

    /// Set the coordinator channel capacity
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Set the RNG seed
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Load configuration from the standard config file location
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load configuration from an explicit path, defaults if it doesn't exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| {
            ChessBenchError::Config(format!(
                "Failed to read config file {}: {}",
                config_path.display(),
                e
            ))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            ChessBenchError::Config(format!(
                "Failed to parse config file {}: {}",
                config_path.display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the standard config file location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ChessBenchError::Config(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| {
            ChessBenchError::Config(format!(
                "Failed to write config file {}: {}",
                config_path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Get the standard configuration file path
    /// Uses $CONFIG_HOME/chessbench/chessbench.toml
    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            ChessBenchError::Config("Unable to determine config directory".to_string())
        })?;

        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}

fn parse_non_negative<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T> {
    raw.trim().parse::<T>().map_err(|_| {
        ChessBenchError::Validation(format!(
            "{} must be a non-negative integer, got {:?}",
            field, raw
        ))
    })
}

mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

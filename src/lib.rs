//! chessbench - threads vs processes
//!
//! Runs the same synthetic workload under two execution models, concurrent
//! threads sharing one board and isolated processes relaying their moves to a
//! coordinator, and reports which one finished first.

use std::fmt;

pub mod bench;
pub mod board;
pub mod config;
pub mod harness;
pub mod models;
pub mod report;
pub mod simple;
pub mod util;
pub mod workload;

// Common error types
#[derive(Debug)]
pub enum ChessBenchError {
    /// Malformed user input, reported before any work starts
    Validation(String),
    /// The board has no occupied or no empty cell to move between
    Precondition(String),
    /// A worker thread or process failed to start, run or join
    Worker(String),
    /// The coordinator channel could not be used
    Channel(String),
    /// Configuration file could not be loaded or saved
    Config(String),
    /// I/O operation failed
    Io(std::io::Error),
}

impl fmt::Display for ChessBenchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChessBenchError::Validation(msg) => write!(f, "Invalid input: {}", msg),
            ChessBenchError::Precondition(msg) => write!(f, "Board precondition failed: {}", msg),
            ChessBenchError::Worker(msg) => write!(f, "Worker error: {}", msg),
            ChessBenchError::Channel(msg) => write!(f, "Channel error: {}", msg),
            ChessBenchError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ChessBenchError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for ChessBenchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChessBenchError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ChessBenchError {
    fn from(err: std::io::Error) -> Self {
        ChessBenchError::Io(err)
    }
}

impl From<serde_json::Error> for ChessBenchError {
    fn from(err: serde_json::Error) -> Self {
        ChessBenchError::Channel(format!("JSON message error: {}", err))
    }
}

impl From<toml::de::Error> for ChessBenchError {
    fn from(err: toml::de::Error) -> Self {
        ChessBenchError::Config(format!("TOML parsing error: {}", err))
    }
}

impl From<toml::ser::Error> for ChessBenchError {
    fn from(err: toml::ser::Error) -> Self {
        ChessBenchError::Config(format!("TOML serialization error: {}", err))
    }
}

/// Result type alias for chessbench operations
pub type Result<T> = std::result::Result<T, ChessBenchError>;

/// Error handling utilities
pub mod error {
    use super::ChessBenchError;

    /// Whether the error happened before any benchmark work was started
    pub fn is_pre_start(error: &ChessBenchError) -> bool {
        matches!(
            error,
            ChessBenchError::Validation(_) | ChessBenchError::Config(_)
        )
    }

    /// Convert error to user-friendly message with suggestions
    pub fn user_friendly_message(error: &ChessBenchError) -> String {
        match error {
            ChessBenchError::Validation(msg) => {
                format!("Error: enter valid numbers for moves and interval ({}).", msg)
            }
            ChessBenchError::Precondition(_) => {
                "The board ran out of legal relocations; the mode was aborted.".to_string()
            }
            ChessBenchError::Worker(msg) => {
                format!("A worker failed: {}. Check that the worker binary can be executed.", msg)
            }
            ChessBenchError::Config(msg) => {
                format!("Configuration error: {}. Check your settings.", msg)
            }
            _ => error.to_string(),
        }
    }
}

// Common types and constants
pub const APP_NAME: &str = "chessbench";
pub const CONFIG_FILE: &str = "chessbench.toml";
/// Hidden subcommand a process-mode child is started with
pub const WORKER_SUBCOMMAND: &str = "worker";
/// Number of players each execution mode runs
pub const PLAYER_COUNT: u32 = 2;

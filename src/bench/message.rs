//! Progress messages a process worker sends to its coordinator
//!
//! One JSON object per line on the worker's stdout. Ordering is FIFO per
//! worker; nothing is guaranteed across workers.

use serde::{Deserialize, Serialize};
use std::io::Write;
use crate::Result;

/// Kind of progress a worker reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageKind {
    /// One move is ready to be applied by the coordinator
    Move,
    /// Sentinel: the worker made all of its moves
    Done,
}

/// A single progress report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressMessage {
    pub worker_id: u32,
    pub kind: MessageKind,
    /// 1-based move number; for DONE, the number of moves made
    pub sequence: u32,
}

impl ProgressMessage {
    pub fn moved(worker_id: u32, sequence: u32) -> Self {
        Self {
            worker_id,
            kind: MessageKind::Move,
            sequence,
        }
    }

    pub fn done(worker_id: u32, moves: u32) -> Self {
        Self {
            worker_id,
            kind: MessageKind::Done,
            sequence: moves,
        }
    }

    pub fn is_done(&self) -> bool {
        self.kind == MessageKind::Done
    }

    /// Write the message as one line and flush it
    pub fn write_line<W: Write>(&self, writer: &mut W) -> Result<()> {
        serde_json::to_writer(&mut *writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    /// Decode one line produced by [`ProgressMessage::write_line`]
    pub fn from_line(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line.trim())?)
    }
}

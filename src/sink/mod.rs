//! Optional log forwarding
//!
//! A sink is best-effort: the local log stays authoritative and sink failures
//! are only reported as diagnostics.

pub mod file;
pub mod wire;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

pub use file::LineFileSink;
pub use wire::{WireError, encode_line, parse_line};

use crate::persistence::{LogRecord, RecordKind};

/// Delivery pattern of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// One record, sent as it is logged
    Immediate,
    /// The whole buffer, sent once when the session closes
    Final,
}

impl SinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkKind::Immediate => "immediate",
            SinkKind::Final => "final",
        }
    }

    /// Record type the receiving side stores
    pub fn record_kind(&self) -> RecordKind {
        match self {
            SinkKind::Immediate => RecordKind::Immediate,
            SinkKind::Final => RecordKind::Final,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("sink rejected batch: {0}")]
    Rejected(String),

    #[error("empty {} batch", .0.as_str())]
    EmptyBatch(SinkKind),

    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Acknowledgement of an accepted batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkReceipt {
    pub server_time: String,
    pub accepted: usize,
}

/// External destination for log records
pub trait RemoteSink {
    fn send(&mut self, records: &[LogRecord], kind: SinkKind) -> Result<SinkReceipt, SinkError>;
}

/// In-memory sink that remembers every batch. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    batches: Rc<RefCell<Vec<(SinkKind, Vec<LogRecord>)>>>,
    failing: Rc<Cell<bool>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following send fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    pub fn batches(&self) -> Vec<(SinkKind, Vec<LogRecord>)> {
        self.batches.borrow().clone()
    }
}

impl RemoteSink for MemorySink {
    fn send(&mut self, records: &[LogRecord], kind: SinkKind) -> Result<SinkReceipt, SinkError> {
        if self.failing.get() {
            return Err(SinkError::Rejected("sink unavailable".to_string()));
        }
        self.batches.borrow_mut().push((kind, records.to_vec()));
        Ok(SinkReceipt {
            server_time: String::new(),
            accepted: records.len(),
        })
    }
}

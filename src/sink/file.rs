//! File-backed log sink (server side)
//!
//! Accepts immediate and final batches, stamps them with the receive time and
//! appends them as pipe-delimited lines.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::wire::{encode_line, parse_line};
use super::{RemoteSink, SinkError, SinkKind, SinkReceipt};
use crate::clock::{Clock, SystemClock};
use crate::persistence::LogRecord;

pub struct LineFileSink {
    path: PathBuf,
    clock: Box<dyn Clock>,
}

impl LineFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_clock(path, Box::new(SystemClock))
    }

    pub fn with_clock(path: impl Into<PathBuf>, clock: Box<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            clock,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored records ordered by sequence. Unparsable lines are skipped.
    pub fn read_lines(&self) -> Result<Vec<LogRecord>, SinkError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records: Vec<LogRecord> = raw
            .lines()
            .filter(|line| !line.is_empty())
            .filter_map(|line| match parse_line(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("Skipping bad sink line: {}", e);
                    None
                }
            })
            .collect();
        records.sort_by_key(|r| r.sequence);
        Ok(records)
    }
}

impl RemoteSink for LineFileSink {
    fn send(&mut self, records: &[LogRecord], kind: SinkKind) -> Result<SinkReceipt, SinkError> {
        if records.is_empty() {
            return Err(SinkError::EmptyBatch(kind));
        }

        let server_time = self.clock.server_time();
        let mut out = String::new();
        for record in records {
            out.push_str(&encode_line(&record.stamped(kind.record_kind(), &server_time)));
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(out.as_bytes())?;

        Ok(SinkReceipt {
            server_time,
            accepted: records.len(),
        })
    }
}

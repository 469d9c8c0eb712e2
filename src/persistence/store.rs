//! Bounded append-only event log
//!
//! The whole buffer is written through to the backend on every append. A failed
//! write never loses the in-memory record: it suspends persistence and leaves a
//! warning for the caller until [`LogStore::retry_persistence`] succeeds.

use std::collections::VecDeque;

use super::backend::{PersistentStore, StoreError};
use super::record::LogRecord;
use crate::clock::{Clock, Sequencer, SystemClock};
use crate::consts::{LOG_STORAGE_KEY, MAX_LOG_SIZE};

/// Why persistence is currently suspended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWarning {
    QuotaExceeded,
    WriteFailed(String),
}

impl From<&StoreError> for StoreWarning {
    fn from(err: &StoreError) -> Self {
        if err.is_quota() {
            StoreWarning::QuotaExceeded
        } else {
            StoreWarning::WriteFailed(err.to_string())
        }
    }
}

/// Outcome of reading back a persisted buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Records that passed structural validation
    pub recovered: usize,
    /// Records dropped for missing/invalid fields
    pub dropped: usize,
    /// The stored value was not a JSON array at all
    pub corrupt: bool,
}

pub struct LogStore {
    records: VecDeque<LogRecord>,
    capacity: usize,
    key: String,
    sequencer: Sequencer,
    backend: Box<dyn PersistentStore>,
    clock: Box<dyn Clock>,
    warning: Option<StoreWarning>,
}

impl std::fmt::Debug for LogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogStore")
            .field("len", &self.records.len())
            .field("capacity", &self.capacity)
            .field("key", &self.key)
            .field("last_sequence", &self.sequencer.last())
            .field("warning", &self.warning)
            .finish()
    }
}

impl LogStore {
    /// Empty store; call [`load_persisted`](Self::load_persisted) to resume.
    pub fn new(
        backend: Box<dyn PersistentStore>,
        clock: Box<dyn Clock>,
        key: impl Into<String>,
        capacity: usize,
    ) -> Self {
        Self {
            records: VecDeque::new(),
            capacity: capacity.max(1),
            key: key.into(),
            sequencer: Sequencer::new(),
            backend,
            clock,
            warning: None,
        }
    }

    /// Store with the default key, capacity and system clock, already resumed
    /// from whatever `backend` holds.
    pub fn open(backend: Box<dyn PersistentStore>) -> (Self, LoadReport) {
        let mut store = Self::new(
            backend,
            Box::new(SystemClock),
            LOG_STORAGE_KEY,
            MAX_LOG_SIZE,
        );
        let report = store.load_persisted();
        (store, report)
    }

    /// Replace the in-memory buffer with the persisted one.
    ///
    /// Records missing a sequence or timestamp are dropped; unreadable data
    /// yields an empty buffer. The sequence counter resumes at the number of
    /// valid records.
    pub fn load_persisted(&mut self) -> LoadReport {
        let mut report = LoadReport::default();
        self.records.clear();

        let raw = match self.backend.load(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                log::info!("No persisted log under '{}', starting fresh", self.key);
                self.sequencer = Sequencer::new();
                return report;
            }
            Err(e) => {
                log::warn!("Could not read persisted log '{}': {}", self.key, e);
                self.sequencer = Sequencer::new();
                report.corrupt = true;
                return report;
            }
        };

        let values: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(values) => values,
            Err(e) => {
                log::warn!("Persisted log '{}' is malformed, discarding: {}", self.key, e);
                self.sequencer = Sequencer::new();
                report.corrupt = true;
                return report;
            }
        };

        for value in values {
            match serde_json::from_value::<LogRecord>(value) {
                Ok(record) => self.records.push_back(record),
                Err(_) => report.dropped += 1,
            }
        }
        report.recovered = self.records.len();
        self.sequencer = Sequencer::resume_at(report.recovered as u64);
        self.evict();

        log::info!(
            "Loaded {} log records ({} dropped)",
            report.recovered,
            report.dropped
        );
        report
    }

    /// Append a new record, evict the oldest beyond capacity, persist.
    pub fn append(&mut self, message: impl Into<String>) -> LogRecord {
        let record = LogRecord::new(
            self.sequencer.next(),
            self.clock.local_time(),
            message.into(),
        );
        self.records.push_back(record.clone());
        self.evict();

        if self.warning.is_none() {
            if let Err(e) = self.persist() {
                log::warn!("Log persistence suspended: {}", e);
                self.warning = Some(StoreWarning::from(&e));
            }
        }

        record
    }

    /// Clear a suspended-persistence warning and write the buffer again.
    pub fn retry_persistence(&mut self) -> Result<(), StoreError> {
        self.warning = None;
        if let Err(e) = self.persist() {
            self.warning = Some(StoreWarning::from(&e));
            return Err(e);
        }
        log::info!("Log persistence resumed");
        Ok(())
    }

    /// Full ordered buffer for a bulk handoff. Does not clear the store.
    pub fn drain(&self) -> Vec<LogRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn records(&self) -> impl Iterator<Item = &LogRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&LogRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Last sequence number handed out
    pub fn last_sequence(&self) -> u64 {
        self.sequencer.last()
    }

    /// Set while persistence is suspended
    pub fn warning(&self) -> Option<&StoreWarning> {
        self.warning.as_ref()
    }

    fn evict(&mut self) {
        while self.records.len() > self.capacity {
            self.records.pop_front();
        }
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.records)?;
        self.backend.save(&self.key, &json)
    }
}

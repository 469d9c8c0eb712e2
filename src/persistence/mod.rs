//! Durable event log
//!
//! Features:
//! - Monotonic sequence numbers, resumed on reload
//! - Capacity-bounded buffer with FIFO eviction
//! - Full-buffer write-through on every append
//! - Structural validation and corruption recovery on load
//! - Soft failure: a full or broken backend suspends persistence, never logging

pub mod backend;
pub mod record;
pub mod store;

pub use backend::{FileStore, MemoryStore, PersistentStore, StoreError};
pub use record::{LogRecord, NO_SERVER_TIME, RecordKind};
pub use store::{LoadReport, LogStore, StoreWarning};

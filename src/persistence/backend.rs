//! Key-value durable storage backends
//!
//! The log store only needs whole-value `save`/`load` under a fixed key plus a
//! distinguishable quota failure, mirroring browser LocalStorage.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Failure of a persistent store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend has no room for the value
    #[error("storage quota exceeded")]
    QuotaExceeded,

    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend-specific failure (e.g. LocalStorage unavailable)
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_quota(&self) -> bool {
        matches!(self, StoreError::QuotaExceeded)
    }
}

/// Durable key-value storage
pub trait PersistentStore {
    /// Replace the value stored under `key`
    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Value stored under `key`, `None` if never written
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;
}

/// In-memory store with an optional byte quota.
///
/// Clones share the same entries, so a test can keep a handle after giving one
/// to a [`LogStore`](super::LogStore).
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
    quota: Rc<Cell<Option<usize>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that refuses values longer than `bytes`
    pub fn with_quota(bytes: usize) -> Self {
        let store = Self::default();
        store.set_quota(Some(bytes));
        store
    }

    pub fn set_quota(&self, bytes: Option<usize>) {
        self.quota.set(bytes);
    }

    /// Raw value under `key`
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    /// Seed a raw value, bypassing the quota
    pub fn insert(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}

impl PersistentStore for MemoryStore {
    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(limit) = self.quota.get() {
            if value.len() > limit {
                return Err(StoreError::QuotaExceeded);
            }
        }
        self.insert(key, value);
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.get(key))
    }
}

/// One JSON file per key inside a directory.
///
/// Writes go to `<key>.json.tmp` and are renamed over `<key>.json`, so a crash
/// mid-write leaves the previous buffer intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

fn map_io(err: io::Error) -> StoreError {
    match err.kind() {
        ErrorKind::StorageFull | ErrorKind::QuotaExceeded => StoreError::QuotaExceeded,
        _ => StoreError::Io(err),
    }
}

impl PersistentStore for FileStore {
    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(map_io)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        let mut file = fs::File::create(&tmp).map_err(map_io)?;
        file.write_all(value.as_bytes()).map_err(map_io)?;
        file.sync_all().map_err(map_io)?;
        fs::rename(&tmp, &path).map_err(map_io)?;
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(map_io(e)),
        }
    }
}

//! Browser platform pieces (wasm32 only)

use crate::persistence::{PersistentStore, StoreError};

/// Install console logging and the panic hook
pub fn init_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

/// `window.localStorage`
#[derive(Debug, Default)]
pub struct LocalStorageStore;

impl LocalStorageStore {
    fn storage() -> Result<web_sys::Storage, StoreError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| StoreError::Backend("LocalStorage unavailable".to_string()))
    }
}

impl PersistentStore for LocalStorageStore {
    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        // setItem only throws on QuotaExceededError (or disabled storage)
        Self::storage()?
            .set_item(key, value)
            .map_err(|_| StoreError::QuotaExceeded)
    }

    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| StoreError::Backend(format!("{e:?}")))
    }
}

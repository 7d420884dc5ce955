//! Browser session storage

use vitalwatch::session::{KeyValueStore, SessionError, SessionResult, SessionStore};

/// `window.localStorage`, or nothing when the browser denies access
#[derive(Debug, Clone)]
pub struct LocalStorage {
    storage: Option<web_sys::Storage>,
}

impl LocalStorage {
    pub fn new() -> Self {
        Self {
            storage: web_sys::window().and_then(|w| w.local_storage().ok().flatten()),
        }
    }

    fn storage(&self) -> SessionResult<&web_sys::Storage> {
        self.storage
            .as_ref()
            .ok_or_else(|| SessionError::Storage("localStorage unavailable".to_string()))
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> SessionResult<()> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| SessionError::Storage(format!("{:?}", e)))
    }

    fn remove(&mut self, key: &str) -> SessionResult<()> {
        self.storage()?
            .remove_item(key)
            .map_err(|e| SessionError::Storage(format!("{:?}", e)))
    }
}

/// The session kept in localStorage
pub fn session_store() -> SessionStore<LocalStorage> {
    SessionStore::new(LocalStorage::new())
}

//! Key-value stores backing the session
//!
//! The browser uses `localStorage`; natively a small JSON file plays the
//! same role. Both look like a string-to-string map.

use std::collections::BTreeMap;

#[cfg(feature = "native")]
use std::path::{Path, PathBuf};

use super::SessionResult;

/// Persistent string map
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> SessionResult<()>;

    fn remove(&mut self, key: &str) -> SessionResult<()>;
}

/// In-memory store, for tests and ephemeral sessions
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> SessionResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> SessionResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// File name of the native session store
#[cfg(feature = "native")]
pub const SESSION_FILE: &str = "session.json";

/// JSON file store, rewritten on every change
#[cfg(feature = "native")]
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

#[cfg(feature = "native")]
impl FileStore {
    /// Open `session.json` under `dir`, creating the directory if needed
    ///
    /// A missing or unreadable file starts an empty store.
    pub fn open(dir: impl AsRef<Path>) -> SessionResult<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(SESSION_FILE);

        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Ignoring corrupt session file {:?}: {}", path, e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> SessionResult<()> {
        let tmp = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(feature = "native")]
impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> SessionResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> SessionResult<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        store.set("token", "abc").unwrap();
        assert_eq!(store.get("token").as_deref(), Some("abc"));
        store.remove("token").unwrap();
        assert!(store.get("token").is_none());
        assert!(store.is_empty());
    }

    #[cfg(feature = "native")]
    #[test]
    fn test_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = FileStore::open(dir.path()).unwrap();
            store.set("token", "abc").unwrap();
            store.set("user", r#"{"name":"Ada"}"#).unwrap();
        }

        let mut reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get("token").as_deref(), Some("abc"));
        reopened.remove("token").unwrap();

        let again = FileStore::open(dir.path()).unwrap();
        assert!(again.get("token").is_none());
        assert!(again.get("user").is_some());
    }

    #[cfg(feature = "native")]
    #[test]
    fn test_file_store_ignores_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SESSION_FILE), "not json").unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(store.get("token").is_none());
    }
}

//! Session
//!
//! The credential token and the user snapshot, kept in a [`KeyValueStore`]
//! under the `token` and `user` keys. Created at login or registration,
//! destroyed at logout or on any authentication failure, and read on every
//! start to gate access.

pub mod store;

#[cfg(feature = "native")]
pub use store::FileStore;
pub use store::{KeyValueStore, MemoryStore};

use thiserror::Error;

use crate::api::UserProfile;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

/// Session errors
#[derive(Error, Debug)]
pub enum SessionError {
    /// No token stored; the caller should go to login
    #[error("Not logged in")]
    NotAuthenticated,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Browser storage refused the operation
    #[error("Storage error: {0}")]
    Storage(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// An authenticated session
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: Option<UserProfile>,
}

impl Session {
    pub fn new(token: impl Into<String>, user: Option<UserProfile>) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }
}

/// Typed access to the session entries of a store
#[derive(Debug)]
pub struct SessionStore<S> {
    store: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Current session, if a non-empty token is stored
    ///
    /// A corrupt `user` entry is treated as absent.
    pub fn load(&self) -> Option<Session> {
        let token = self.store.get(TOKEN_KEY).filter(|t| !t.trim().is_empty())?;

        let user = self.store.get(USER_KEY).and_then(|raw| {
            serde_json::from_str::<UserProfile>(&raw)
                .map_err(|e| tracing::warn!("Stored user is not valid JSON: {}", e))
                .ok()
        });

        Some(Session { token, user })
    }

    /// Session guard: the current session or `NotAuthenticated`
    pub fn require(&self) -> SessionResult<Session> {
        self.load().ok_or(SessionError::NotAuthenticated)
    }

    pub fn is_authenticated(&self) -> bool {
        self.load().is_some()
    }

    pub fn save(&mut self, session: &Session) -> SessionResult<()> {
        self.store.set(TOKEN_KEY, &session.token)?;
        match &session.user {
            Some(user) => self.save_user(user),
            None => self.store.remove(USER_KEY),
        }
    }

    /// Replace the stored user snapshot, e.g. after a profile update
    pub fn save_user(&mut self, user: &UserProfile) -> SessionResult<()> {
        let raw = serde_json::to_string(user)?;
        self.store.set(USER_KEY, &raw)
    }

    /// Destroy the session
    pub fn clear(&mut self) -> SessionResult<()> {
        self.store.remove(TOKEN_KEY)?;
        self.store.remove(USER_KEY)?;
        tracing::info!("Session cleared");
        Ok(())
    }

    pub fn inner(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> UserProfile {
        UserProfile {
            name: Some(name.to_string()),
            email: Some("ada@example.com".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_save_load_clear() {
        let mut sessions = SessionStore::new(MemoryStore::new());
        assert!(sessions.load().is_none());

        let session = Session::new("tok-1", Some(user("Ada")));
        sessions.save(&session).unwrap();
        assert_eq!(sessions.load(), Some(session));

        sessions.clear().unwrap();
        assert!(sessions.load().is_none());
        assert!(sessions.inner().is_empty());
    }

    #[test]
    fn test_guard_without_token() {
        let mut store = MemoryStore::new();
        store.set(USER_KEY, r#"{"name":"Ada"}"#).unwrap();
        let sessions = SessionStore::new(store);
        assert!(matches!(sessions.require(), Err(SessionError::NotAuthenticated)));
    }

    #[test]
    fn test_blank_token_is_absent() {
        let mut store = MemoryStore::new();
        store.set(TOKEN_KEY, "  ").unwrap();
        assert!(!SessionStore::new(store).is_authenticated());
    }

    #[test]
    fn test_corrupt_user_is_absent() {
        let mut store = MemoryStore::new();
        store.set(TOKEN_KEY, "tok").unwrap();
        store.set(USER_KEY, "{not json").unwrap();
        let session = SessionStore::new(store).require().unwrap();
        assert_eq!(session.token, "tok");
        assert!(session.user.is_none());
    }

    #[test]
    fn test_save_user_replaces_snapshot() {
        let mut sessions = SessionStore::new(MemoryStore::new());
        sessions.save(&Session::new("tok", Some(user("Ada")))).unwrap();
        sessions.save_user(&user("Grace")).unwrap();
        let loaded = sessions.load().unwrap();
        assert_eq!(loaded.user.unwrap().display_name(), "Grace");
    }
}

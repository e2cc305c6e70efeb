//! Session lookup
//!
//! The connected user lives in a key/value storage under the `user` key as
//! serialized JSON. Controllers never read the storage directly; they go
//! through a [`SessionProvider`].

use crate::error::CoreError;
use crate::models::Session;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Storage key holding the serialized user
pub const USER_KEY: &str = "user";

/// Read access to a persisted key/value session storage
pub trait SessionStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
}

/// In-memory storage with the usual get/set/remove/clear surface
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage already holding `user`
    pub fn with_user(session: &Session) -> Self {
        let storage = Self::new();
        if let Ok(json) = serde_json::to_string(session) {
            storage.set_item(USER_KEY, &json);
        }
        storage
    }

    pub fn set_item(&self, key: &str, value: &str) {
        if let Ok(mut items) = self.items.write() {
            items.insert(key.to_string(), value.to_string());
        }
    }

    pub fn remove_item(&self, key: &str) {
        if let Ok(mut items) = self.items.write() {
            items.remove(key);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut items) = self.items.write() {
            items.clear();
        }
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.read().ok().and_then(|items| items.get(key).cloned())
    }
}

/// Why no session could be produced
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("No user in session storage")]
    NotAuthenticated,

    #[error("Malformed user in session storage: {message}")]
    Malformed { message: String },
}

impl From<SessionError> for CoreError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::NotAuthenticated => CoreError::NotAuthenticated,
            SessionError::Malformed { message } => CoreError::MalformedSession { message },
        }
    }
}

/// Source of the connected user
pub trait SessionProvider: Send + Sync {
    fn current(&self) -> Result<Session, SessionError>;
}

/// Session provider backed by a [`SessionStorage`]
#[derive(Clone)]
pub struct StorageSessionProvider {
    storage: Arc<dyn SessionStorage>,
}

impl StorageSessionProvider {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }
}

impl SessionProvider for StorageSessionProvider {
    fn current(&self) -> Result<Session, SessionError> {
        let raw = self
            .storage
            .get_item(USER_KEY)
            .ok_or(SessionError::NotAuthenticated)?;
        let session: Session = serde_json::from_str(&raw).map_err(|e| SessionError::Malformed {
            message: e.to_string(),
        })?;
        if session.email.trim().is_empty() {
            return Err(SessionError::Malformed {
                message: "empty email".to_string(),
            });
        }
        Ok(session)
    }
}

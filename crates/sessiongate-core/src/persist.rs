//! The durable form of a session and an in-memory store for it.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::StorageError;
use crate::state::SessionState;
use crate::token::Token;
use crate::traits::SessionStorage;

/// Well-known key the session blob is stored under.
pub const SESSION_KEY: &str = "session";

/// What gets written to durable storage.
///
/// `is_fetching` is not stored. An exchange never survives a restart, so a
/// restored session always starts idle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub token: Option<Token>,
    pub date_received: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl From<&SessionState> for PersistedSession {
    fn from(state: &SessionState) -> Self {
        Self {
            token: state.token.clone(),
            date_received: state.date_received,
            error: state.error.clone(),
        }
    }
}

impl PersistedSession {
    /// Serialize a state to its storage blob.
    pub fn encode(state: &SessionState) -> Result<String, StorageError> {
        Ok(serde_json::to_string_pretty(&PersistedSession::from(state))?)
    }

    /// Parse a storage blob back into a state.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupt`] if the blob does not parse or a token
    /// and its received date are not stored together.
    pub fn decode(blob: &str) -> Result<SessionState, StorageError> {
        let persisted: PersistedSession = serde_json::from_str(blob)?;
        persisted.into_state()
    }

    fn into_state(self) -> Result<SessionState, StorageError> {
        if self.token.is_some() != self.date_received.is_some() {
            return Err(StorageError::Corrupt {
                message: "token and date_received must be stored together".to_string(),
            });
        }
        Ok(SessionState {
            token: self.token,
            is_fetching: false,
            error: self.error,
            date_received: self.date_received,
        })
    }
}

/// Session storage that lives only as long as the process.
///
/// Clones share the same slot, so a clone handed to a fresh context behaves
/// like storage that survived a restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blob: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with a raw blob.
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Arc::new(Mutex::new(Some(blob.into()))),
        }
    }

    /// The raw stored blob, if any.
    pub fn blob(&self) -> Option<String> {
        self.slot().clone()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.blob.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn save(&self, state: &SessionState) -> Result<(), StorageError> {
        let blob = PersistedSession::encode(state)?;
        trace!(key = SESSION_KEY, bytes = blob.len(), "saving session to memory");
        *self.slot() = Some(blob);
        Ok(())
    }

    async fn load(&self) -> Result<Option<SessionState>, StorageError> {
        match self.slot().as_deref() {
            Some(blob) => PersistedSession::decode(blob).map(Some),
            None => Ok(None),
        }
    }

    async fn clear(&self) -> Result<(), StorageError> {
        *self.slot() = None;
        Ok(())
    }
}

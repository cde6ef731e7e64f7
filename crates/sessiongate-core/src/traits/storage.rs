//! Durable session storage trait.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::state::SessionState;

/// Where the last committed [`SessionState`] survives restarts.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Persist `state`, replacing whatever was stored before.
    async fn save(&self, state: &SessionState) -> Result<(), StorageError>;

    /// Read back the last saved state. `Ok(None)` means nothing was saved.
    async fn load(&self) -> Result<Option<SessionState>, StorageError>;

    /// Forget the stored state.
    async fn clear(&self) -> Result<(), StorageError>;
}

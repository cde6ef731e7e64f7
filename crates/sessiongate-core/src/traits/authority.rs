//! Credential exchange trait.

use async_trait::async_trait;

use crate::{Credentials, Result, Token};

/// A remote authority that trades credentials for a session token.
#[async_trait]
pub trait Authority: Send + Sync {
    /// Exchange credentials for a token.
    ///
    /// # Errors
    ///
    /// Implementations must classify failures: a credential rejection is
    /// [`Error::InvalidCredentials`](crate::Error::InvalidCredentials), anything
    /// else is [`Error::ExchangeFailed`](crate::Error::ExchangeFailed).
    async fn exchange(&self, credentials: &Credentials) -> Result<Token>;
}

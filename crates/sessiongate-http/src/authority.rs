//! Credential exchange over HTTP.

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use sessiongate_core::error::ExchangeError;
use sessiongate_core::{Authority, BaseUrl, ClientConfig, Credentials, Error, Result, Token};

use crate::client::JsonClient;
use crate::endpoints::{LOGIN, LoginRequest, LoginResponse};

/// The remote login authority, reached with `POST <base-url>/login`.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use sessiongate_core::{ClientConfig, MemoryStorage, SessionContext};
/// use sessiongate_http::HttpAuthority;
///
/// # async fn example() -> sessiongate_core::Result<()> {
/// let config = ClientConfig::default();
/// let session = SessionContext::restore(
///     HttpAuthority::new(&config),
///     MemoryStorage::new(),
///     config.restore_timeout,
/// )
/// .await;
/// session.login("alice", "hunter2").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpAuthority {
    client: JsonClient,
}

impl HttpAuthority {
    /// Create an authority client from the shared configuration.
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: JsonClient::new(config.base_url.clone(), config.request_timeout),
        }
    }

    /// Returns the base URL of the authority.
    pub fn base_url(&self) -> &BaseUrl {
        self.client.base_url()
    }

    /// Returns the full login URL.
    pub fn login_url(&self) -> String {
        self.client.base_url().endpoint(LOGIN)
    }
}

#[async_trait]
impl Authority for HttpAuthority {
    #[instrument(skip(self, credentials), fields(username = %credentials.username()))]
    async fn exchange(&self, credentials: &Credentials) -> Result<Token> {
        info!("Exchanging credentials");

        let request = LoginRequest {
            username: credentials.username(),
            password: credentials.password(),
        };

        match self.client.post::<_, LoginResponse>(LOGIN, &request).await {
            Ok(response) => {
                debug!("Token received");
                Ok(Token::new(response.token))
            }
            Err(ExchangeError::Protocol(e)) if e.is_credential_rejection() => {
                debug!(status = e.status, message = e.message.as_deref(), "Credentials rejected");
                Err(Error::InvalidCredentials)
            }
            Err(e) => Err(Error::ExchangeFailed(e)),
        }
    }
}

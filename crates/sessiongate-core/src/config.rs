//! Client configuration.

use std::time::Duration;

use crate::types::BaseUrl;

/// Default authority for local development.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Default bound on a single login request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default bound on reading the persisted session at startup.
pub const DEFAULT_RESTORE_TIMEOUT: Duration = Duration::from_secs(2);

/// Settings shared by the exchange and the session context.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the login authority.
    pub base_url: BaseUrl,
    /// Upper bound for one credential exchange.
    pub request_timeout: Duration,
    /// Upper bound for restoring the saved session before rendering.
    pub restore_timeout: Duration,
}

impl ClientConfig {
    /// Configuration for `base_url` with default timeouts.
    pub fn new(base_url: BaseUrl) -> Self {
        Self {
            base_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            restore_timeout: DEFAULT_RESTORE_TIMEOUT,
        }
    }

    /// Override the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Override the restore timeout.
    pub fn with_restore_timeout(mut self, timeout: Duration) -> Self {
        self.restore_timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(BaseUrl::new(DEFAULT_BASE_URL).expect("default base URL is valid"))
    }
}

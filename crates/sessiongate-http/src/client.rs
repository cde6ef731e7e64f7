//! JSON-over-HTTP client for the authority.

use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, trace};

use sessiongate_core::BaseUrl;
use sessiongate_core::error::{ExchangeError, ProtocolError, TransportError};

use crate::endpoints::ErrorResponse;

/// HTTP client bound to one authority base URL.
#[derive(Debug, Clone)]
pub struct JsonClient {
    client: reqwest::Client,
    base_url: BaseUrl,
}

impl JsonClient {
    /// Create a client for `base_url` whose requests give up after `timeout`.
    pub fn new(base_url: BaseUrl, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("sessiongate/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");

        Self { client, base_url }
    }

    /// Returns the base URL this client is configured for.
    pub fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// POST a JSON body to `endpoint` and decode a JSON reply.
    #[instrument(skip(self, body), fields(base_url = %self.base_url))]
    pub async fn post<B, R>(&self, endpoint: &str, body: &B) -> Result<R, ExchangeError>
    where
        B: Serialize + std::fmt::Debug,
        R: DeserializeOwned,
    {
        let url = self.base_url.endpoint(endpoint);
        debug!(%url, "POST");
        trace!(?body, "request body");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        self.handle_response(response).await
    }

    /// Decode a success body, or turn the status into a protocol error.
    async fn handle_response<R: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<R, ExchangeError> {
        let status = response.status();
        trace!(status = %status, "response");

        if status.is_success() {
            let body = response.bytes().await.map_err(transport_error)?;
            serde_json::from_slice(&body).map_err(|e| {
                ProtocolError::new(
                    status.as_u16(),
                    Some(format!("malformed response body: {}", e)),
                )
                .into()
            })
        } else {
            Err(self.parse_error_response(response).await.into())
        }
    }

    /// Parse an error response, keeping whatever message the server sent.
    async fn parse_error_response(&self, response: reqwest::Response) -> ProtocolError {
        let status = response.status().as_u16();

        match response.json::<ErrorResponse>().await {
            Ok(error_body) => ProtocolError::new(status, error_body.into_message()),
            Err(_) => ProtocolError::new(status, None),
        }
    }
}

/// Classify a reqwest failure.
pub(crate) fn transport_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    }
}

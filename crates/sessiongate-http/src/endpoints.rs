//! Authority endpoint names and wire types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Credential exchange endpoint, relative to the base URL.
pub const LOGIN: &str = "login";

/// Request body for the login endpoint.
#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

impl fmt::Debug for LoginRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Successful response from the login endpoint.
#[derive(Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Error bodies the authority may send.
///
/// Django REST style endpoints report credential failures under
/// `non_field_errors`; others use `detail`, `error` or `message`.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub non_field_errors: Vec<String>,
}

impl ErrorResponse {
    /// The most specific message present.
    pub fn into_message(self) -> Option<String> {
        self.non_field_errors
            .into_iter()
            .next()
            .or(self.detail)
            .or(self.message)
            .or(self.error)
    }
}

//! Error types for sessiongate.
//!
//! Exchange failures are classified so callers can tell a user-correctable
//! credential rejection apart from a transport or server fault.

use std::fmt;
use thiserror::Error;

/// The unified error type for sessiongate operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The authority rejected the username/password pair.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The exchange failed for any reason other than rejected credentials.
    #[error("login failed: {0}")]
    ExchangeFailed(#[from] ExchangeError),

    /// The persisted session could not be read back.
    #[error("could not restore session: {0}")]
    RestoreFailed(#[source] StorageError),

    /// A login was submitted while another one is still in flight.
    #[error("a login is already in progress")]
    LoginInProgress,

    /// The session was signed out before the exchange completed; the
    /// response was discarded.
    #[error("login response discarded: session was signed out")]
    Superseded,

    /// The action is only ever dispatched by the login flow itself.
    #[error("{0} can only be dispatched by login")]
    ReservedAction(&'static str),

    /// Input validation errors (empty credentials, bad URL).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// The message recorded in session state for a failed exchange.
    ///
    /// Only classified, user-facing text ends up in state; the underlying
    /// cause stays in the error value.
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidCredentials => "Invalid username or password.".to_string(),
            Error::ExchangeFailed(_) => "Unable to sign in right now. Please try again.".to_string(),
            Error::RestoreFailed(_) => "Saved session could not be restored.".to_string(),
            Error::LoginInProgress => "A sign-in is already in progress.".to_string(),
            Error::Superseded => "Sign-in was cancelled.".to_string(),
            Error::ReservedAction(_) => "Unable to sign in right now. Please try again.".to_string(),
            Error::InvalidInput(e) => e.to_string(),
        }
    }

    /// Returns true if the user can fix this by correcting the form.
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Error::InvalidCredentials | Error::InvalidInput(_))
    }
}

/// Causes of a failed credential exchange.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The authority answered with an unexpected status or body.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// An unexpected response from the authority.
#[derive(Debug)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// Error detail from the response body, if any.
    pub message: Option<String>,
}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, message: Option<String>) -> Self {
        Self { status, message }
    }

    /// Check if the status signals rejected credentials.
    pub fn is_credential_rejection(&self) -> bool {
        self.status == 400 || self.status == 401
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

/// Persistence errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing store failed.
    #[error("storage IO error: {message}")]
    Io { message: String },

    /// The stored blob could not be decoded.
    #[error("stored session is corrupt: {message}")]
    Corrupt { message: String },

    /// The store did not answer in time.
    #[error("storage did not respond within {duration_ms}ms")]
    Timeout { duration_ms: u64 },
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Corrupt {
            message: err.to_string(),
        }
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// A required credential field was empty.
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    /// Invalid base URL.
    #[error("invalid base URL '{value}': {reason}")]
    BaseUrl { value: String, reason: String },
}

//! Session state and its transition function.
//!
//! [`apply`] is the only way a [`SessionState`] changes. It is pure and total:
//! it never fails, never performs IO, and returns the input unchanged for
//! actions it does not recognize. Side effects (persistence, HTTP) belong to
//! the caller, see [`crate::SessionContext`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::token::Token;

/// The authentication state of the current client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Present iff the user is authenticated.
    pub token: Option<Token>,
    /// True only while a credential exchange is in flight.
    pub is_fetching: bool,
    /// Message of the last failed exchange.
    pub error: Option<String>,
    /// When the current token was received.
    pub date_received: Option<DateTime<Utc>>,
}

impl SessionState {
    /// Returns true if a token is held.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Apply a transition, consuming the current state.
    pub fn apply(self, action: &Action) -> Self {
        apply(Some(self), action)
    }
}

/// A named session transition.
///
/// Serialized with a `type` tag (`REQUEST_TOKEN`, `RECEIVE_TOKEN`, ...). Any
/// other tag decodes to [`Action::Unknown`], which every reducer ignores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// A credential exchange started.
    RequestToken,
    /// The exchange succeeded.
    ReceiveToken {
        token: Token,
        received_at: DateTime<Utc>,
    },
    /// The exchange failed.
    ReceiveError { error: String },
    /// Explicit sign-out.
    DeleteToken,
    /// Anything this reducer does not handle.
    #[serde(other)]
    Unknown,
}

impl Action {
    /// A `RECEIVE_TOKEN` stamped with the current time.
    pub fn receive_token(token: Token) -> Self {
        Action::ReceiveToken {
            token,
            received_at: Utc::now(),
        }
    }

    /// A `RECEIVE_ERROR` carrying a user-facing message.
    pub fn receive_error(error: impl Into<String>) -> Self {
        Action::ReceiveError {
            error: error.into(),
        }
    }

    /// The wire name of this action.
    pub fn name(&self) -> &'static str {
        match self {
            Action::RequestToken => "REQUEST_TOKEN",
            Action::ReceiveToken { .. } => "RECEIVE_TOKEN",
            Action::ReceiveError { .. } => "RECEIVE_ERROR",
            Action::DeleteToken => "DELETE_TOKEN",
            Action::Unknown => "UNKNOWN",
        }
    }
}

/// Compute the next state. A missing state is treated as the default one.
pub fn apply(state: Option<SessionState>, action: &Action) -> SessionState {
    let state = state.unwrap_or_default();

    match action {
        Action::RequestToken => SessionState {
            is_fetching: true,
            ..state
        },
        Action::ReceiveToken { token, received_at } => {
            // never move backwards, even if the wall clock does
            let date_received = match state.date_received {
                Some(previous) if previous > *received_at => previous,
                _ => *received_at,
            };
            SessionState {
                token: Some(token.clone()),
                is_fetching: false,
                error: None,
                date_received: Some(date_received),
            }
        }
        Action::ReceiveError { error } => SessionState {
            error: Some(error.clone()),
            is_fetching: false,
            ..state
        },
        Action::DeleteToken => SessionState::default(),
        Action::Unknown => state,
    }
}

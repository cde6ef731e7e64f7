//! sessiongate-core - session state machine, route guard and core traits.
//!
//! The state lives in a [`SessionContext`], changes only through the pure
//! [`apply`] reducer, is mirrored to a [`SessionStorage`], and gates navigation
//! through [`guard`] and [`Router`]. The login authority sits behind the
//! [`Authority`] trait.

pub mod config;
pub mod context;
pub mod credentials;
pub mod error;
pub mod persist;
pub mod routing;
pub mod state;
pub mod token;
pub mod traits;
pub mod types;

pub use config::ClientConfig;
pub use context::SessionContext;
pub use credentials::Credentials;
pub use error::Error;
pub use persist::{MemoryStorage, PersistedSession, SESSION_KEY};
pub use routing::{
    DASHBOARD_PATH, Decision, LOGIN_PATH, Location, Navigation, Props, RouteRequest, Router,
    View, guard,
};
pub use state::{Action, SessionState, apply};
pub use token::Token;
pub use traits::{Authority, SessionStorage};
pub use types::BaseUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

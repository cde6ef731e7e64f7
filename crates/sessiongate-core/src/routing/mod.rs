//! Auth-gated routing.
//!
//! [`guard`] decides whether a protected view may render for a given
//! [`SessionState`](crate::SessionState) snapshot; [`Router`] applies it to the
//! client's two routes and follows the resulting redirects.

mod guard;
mod request;
mod router;

pub use guard::{Decision, guard};
pub use request::{Location, Props, RouteRequest};
pub use router::{Hop, Navigation, Router, View};

/// Entry point of the login flow.
pub const LOGIN_PATH: &str = "/login";

/// The protected landing view.
pub const DASHBOARD_PATH: &str = "/dashboard";

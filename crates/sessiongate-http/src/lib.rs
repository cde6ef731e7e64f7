//! sessiongate-http - HTTP credential exchange.

mod authority;
mod client;
mod endpoints;

pub use authority::HttpAuthority;
pub use endpoints::LOGIN;

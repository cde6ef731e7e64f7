//! Seams to the outside world: the login authority and durable storage.

mod authority;
mod storage;

pub use authority::Authority;
pub use storage::SessionStorage;

//! sessiongate-file - filesystem-backed session storage.

mod store;

pub use store::FileStorage;

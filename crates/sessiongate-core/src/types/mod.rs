//! Validated configuration types.
//!
//! These types enforce their invariants at construction time,
//! ensuring invalid values are unrepresentable.

mod base_url;

pub use base_url::BaseUrl;

//! Subcommand implementations.

pub mod login;
pub mod logout;
pub mod open;
pub mod status;

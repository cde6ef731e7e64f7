//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sessiongate_core::config::DEFAULT_BASE_URL;

use crate::commands::{login, logout, open, status};

/// Sign in against a token endpoint and browse the guarded routes.
#[derive(Parser, Debug)]
#[command(name = "sessiongate")]
#[command(author, version = env!("SESSIONGATE_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Base URL of the authentication service
    #[arg(
        long,
        global = true,
        env = "SESSIONGATE_BASE_URL",
        default_value = DEFAULT_BASE_URL
    )]
    pub base_url: String,

    /// Directory holding the persisted session
    #[arg(long, global = true, env = "SESSIONGATE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Settings shared by every command.
    pub fn settings(&self) -> Settings {
        Settings {
            base_url: self.base_url.clone(),
            data_dir: self.data_dir.clone(),
        }
    }
}

/// Global options after parsing.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Exchange a username and password for a session token
    Login(login::LoginArgs),

    /// Discard the session token
    Logout(logout::LogoutArgs),

    /// Display the persisted session
    Status(status::StatusArgs),

    /// Navigate to a path and show the view that renders
    Open(open::OpenArgs),
}

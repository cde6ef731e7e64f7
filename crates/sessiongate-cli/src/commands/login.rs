//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::cli::Settings;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account username
    #[arg(long)]
    pub username: String,

    /// Account password
    #[arg(long)]
    pub password: String,
}

pub async fn run(settings: &Settings, args: LoginArgs) -> Result<()> {
    let session = session::restore(settings).await?;

    eprintln!("{}", "Logging in...".dimmed());

    if let Err(e) = session.login(&args.username, &args.password).await {
        output::failed(&e.user_message());
        return Err(e).context("Failed to login");
    }

    let state = session.state();
    output::done("Logged in successfully");
    println!();
    output::field("Username", args.username.trim());
    if let Some(received) = &state.date_received {
        output::received(received);
    }

    Ok(())
}

//! Logout command implementation.

use anyhow::Result;
use clap::Args;

use crate::cli::Settings;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub async fn run(settings: &Settings, _args: LogoutArgs) -> Result<()> {
    let session = session::restore(settings).await?;
    let was_authenticated = session.is_authenticated();

    session.logout().await;

    if was_authenticated {
        output::done("Logged out");
    } else {
        output::done("No active session");
    }

    Ok(())
}

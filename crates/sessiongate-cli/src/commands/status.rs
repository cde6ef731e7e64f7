//! Status command implementation.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

use crate::cli::Settings;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print the status as JSON
    #[arg(long)]
    pub json: bool,
}

/// What `status` reports. The token itself is never printed.
#[derive(Debug, Serialize)]
struct StatusReport {
    authenticated: bool,
    date_received: Option<DateTime<Utc>>,
    error: Option<String>,
}

pub async fn run(settings: &Settings, args: StatusArgs) -> Result<()> {
    let session = session::restore(settings).await?;
    let state = session.state();

    let report = StatusReport {
        authenticated: state.is_authenticated(),
        date_received: state.date_received,
        error: state.error,
    };

    if args.json {
        return output::json(&report);
    }

    let status = if report.authenticated {
        "signed in"
    } else {
        "signed out"
    };
    output::field("Status", status);
    if let Some(received) = &report.date_received {
        output::received(received);
    }
    if let Some(error) = &report.error {
        output::field("Last error", error);
    }

    Ok(())
}

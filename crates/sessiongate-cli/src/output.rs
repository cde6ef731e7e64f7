//! Terminal rendering for session and navigation results.

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

use sessiongate_core::Navigation;

/// Report a completed action on stdout.
pub fn done(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Report a failure on stderr.
pub fn failed(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print an aligned `label: value` line.
pub fn field(label: &str, value: &str) {
    println!("{:>10}: {}", label.dimmed(), value);
}

/// Print a token receipt time, second precision.
pub fn received(at: &DateTime<Utc>) {
    field("Received", &at.to_rfc3339_opts(SecondsFormat::Secs, true));
}

/// Print each redirect taken, then the view that rendered.
pub fn navigation(nav: &Navigation) {
    for hop in &nav.redirects {
        println!("{} {} {}", hop.from.as_str().dimmed(), "→".yellow(), hop.to);
    }
    field("View", &nav.view.to_string());
    field("Location", nav.location.as_str());
    if let Some(pathname) = return_path(nav) {
        field("Return to", pathname);
    }
}

/// The location a guarded redirect preserved, if any.
fn return_path(nav: &Navigation) -> Option<&str> {
    match nav.props.get("from")? {
        Value::Object(from) => from.get("pathname")?.as_str(),
        _ => None,
    }
}

/// Print a value as pretty-printed JSON.
pub fn json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

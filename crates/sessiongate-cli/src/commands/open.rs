//! Open command implementation.

use anyhow::{Result, bail};
use clap::Args;
use serde_json::Value;

use sessiongate_core::RouteRequest;

use crate::cli::Settings;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Path to navigate to
    pub path: String,

    /// Extra props passed to the view, as key=value (repeatable)
    #[arg(long = "prop", value_name = "KEY=VALUE")]
    pub props: Vec<String>,

    /// Print the settled navigation as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(settings: &Settings, args: OpenArgs) -> Result<()> {
    let session = session::restore(settings).await?;

    let mut request = RouteRequest::new(&args.path);
    for prop in &args.props {
        let (key, value) = parse_prop(prop)?;
        request = request.with_prop(key, value);
    }

    let navigation = session.navigate(&request);

    if args.json {
        return output::json(&navigation);
    }

    output::navigation(&navigation);
    Ok(())
}

/// Split a `key=value` prop. Values that parse as JSON keep their type.
fn parse_prop(raw: &str) -> Result<(String, Value)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("Invalid prop '{}': expected KEY=VALUE", raw);
    };
    if key.is_empty() {
        bail!("Invalid prop '{}': empty key", raw);
    }

    let value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

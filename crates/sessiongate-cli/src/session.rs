//! Session setup shared by every command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use tracing::debug;

use sessiongate_core::{BaseUrl, ClientConfig, SessionContext};
use sessiongate_file::FileStorage;
use sessiongate_http::HttpAuthority;

use crate::cli::Settings;

/// The session type every command works with.
pub type CliSession = SessionContext<HttpAuthority, FileStorage>;

/// Resolve the data directory: the `--data-dir` flag, or the platform default.
pub fn data_dir(settings: &Settings) -> Result<PathBuf> {
    if let Some(dir) = &settings.data_dir {
        return Ok(dir.clone());
    }

    let dirs =
        ProjectDirs::from("", "", "sessiongate").context("Could not determine data directory")?;
    Ok(dirs.data_dir().to_path_buf())
}

/// Build the client configuration from the global flags.
pub fn config(settings: &Settings) -> Result<ClientConfig> {
    let base_url = BaseUrl::new(&settings.base_url).context("Invalid base URL")?;
    Ok(ClientConfig::new(base_url))
}

/// Restore the persisted session. Nothing is routed before this returns.
pub async fn restore(settings: &Settings) -> Result<CliSession> {
    let config = config(settings)?;
    let storage = FileStorage::new(data_dir(settings)?);
    debug!(path = %storage.path().display(), base_url = %config.base_url, "Restoring session");

    let session =
        SessionContext::restore(HttpAuthority::new(&config), storage, config.restore_timeout)
            .await;
    Ok(session)
}

//! Filesystem storage for the persisted session.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;
use tracing::{debug, instrument, trace};
use uuid::Uuid;

use sessiongate_core::error::StorageError;
use sessiongate_core::{PersistedSession, SESSION_KEY, SessionState, SessionStorage};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Session storage in a single JSON file: `<dir>/session.json`.
///
/// Writes go to a temporary file that is renamed into place, so readers see
/// either the old or the new blob. A sibling lock file serializes writers
/// across processes.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Get the data directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the session file path.
    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", SESSION_KEY))
    }

    /// Get the lock file path.
    fn lock_path(&self) -> PathBuf {
        self.dir.join(format!("{}.lock", SESSION_KEY))
    }

    fn open_lock(&self) -> io::Result<File> {
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())
    }

    fn write_blob(&self, blob: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let lock = self.open_lock()?;
        lock.lock_exclusive()?;

        let path = self.path();
        let temp_path = self
            .dir
            .join(format!(".{}.{}.tmp", SESSION_KEY, Uuid::new_v4().simple()));

        let result = (|| -> io::Result<()> {
            let mut file = File::create(&temp_path)?;

            // Restrict before any secret hits the disk (Unix only)
            #[cfg(unix)]
            file.set_permissions(fs::Permissions::from_mode(0o600))?;

            file.write_all(blob.as_bytes())?;
            file.sync_data()?;
            fs::rename(&temp_path, &path)
        })();

        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }

        lock.unlock()?;
        result
    }

    fn read_blob(&self) -> io::Result<Option<String>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }

        let lock = self.open_lock()?;
        lock.lock_shared()?;
        let result = match fs::read_to_string(&path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        };
        lock.unlock()?;
        result
    }

    fn remove_blob(&self) -> io::Result<()> {
        if !self.dir.exists() {
            return Ok(());
        }

        let lock = self.open_lock()?;
        lock.lock_exclusive()?;
        let result = match fs::remove_file(self.path()) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        };
        lock.unlock()?;
        result
    }

    /// Run blocking file IO off the async runtime.
    async fn blocking<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(FileStorage) -> io::Result<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || f(store))
            .await
            .map_err(|e| StorageError::Io {
                message: format!("storage task failed: {}", e),
            })?
            .map_err(StorageError::from)
    }
}

#[async_trait]
impl SessionStorage for FileStorage {
    #[instrument(skip(self, state), fields(path = %self.path().display()))]
    async fn save(&self, state: &SessionState) -> Result<(), StorageError> {
        let blob = PersistedSession::encode(state)?;
        self.blocking(move |store| store.write_blob(&blob)).await?;
        trace!(authenticated = state.is_authenticated(), "Saved session");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path().display()))]
    async fn load(&self) -> Result<Option<SessionState>, StorageError> {
        match self.blocking(|store| store.read_blob()).await? {
            Some(blob) => {
                let state = PersistedSession::decode(&blob)?;
                debug!(authenticated = state.is_authenticated(), "Loaded session");
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(path = %self.path().display()))]
    async fn clear(&self) -> Result<(), StorageError> {
        self.blocking(|store| store.remove_blob()).await?;
        debug!("Cleared session");
        Ok(())
    }
}

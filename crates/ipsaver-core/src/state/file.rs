// # File Status Store
//
// File-based implementation of StatusStore with crash tolerance.
//
// ## Purpose
//
// Keeps the status record across daemon restarts so the hourly cadence and
// the change baseline survive a reboot.
//
// ## Crash Tolerance
//
// - Atomic writes: new content goes to `<name>.tmp`, is flushed and synced,
//   then renamed over the status file
// - Corruption detection: JSON and invariant validation on load
// - Recovery: anything unreadable loads as an empty record (start fresh)

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::status::StatusRecord;
use crate::traits::status_store::StatusStore;

/// File-based status store
///
/// # Example
///
/// ```rust,no_run
/// use ipsaver_core::state::FileStatusStore;
/// use ipsaver_core::traits::StatusStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStatusStore::open("/srv/sync/ipStatus.txt").await?;
///
///     let baseline = store.load().await;
///     store.save(&baseline).await?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileStatusStore {
    path: PathBuf,
}

impl FileStatusStore {
    /// Open the status file, creating it empty if it does not exist
    ///
    /// The parent directory is not created. Failing to create the file is a
    /// startup failure.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                return Err(Error::startup(format!(
                    "Status path exists but is not a file: {}",
                    path.display()
                )));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fs::File::create(&path).await.map_err(|e| {
                    Error::startup(format!(
                        "Failed to create status file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                tracing::info!("Created empty status file: {}", path.display());
            }
            Err(e) => {
                return Err(Error::startup(format!(
                    "Failed to inspect status file {}: {}",
                    path.display(),
                    e
                )));
            }
        }

        Ok(Self { path })
    }

    /// Path of the status file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the status file
    ///
    /// `Ok(None)` means there is nothing to parse (missing or blank file).
    async fn read_record(&self) -> Result<Option<StatusRecord>, Error> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::status_store(format!(
                    "Failed to read status file {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        StatusRecord::from_json(&content).map(Some).map_err(|e| {
            Error::status_store(format!(
                "Failed to parse status file {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Write the record atomically
    async fn write_record(&self, record: &StatusRecord) -> Result<(), Error> {
        let json = record
            .to_json()
            .map_err(|e| Error::status_store(format!("Failed to serialize status: {}", e)))?;

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::status_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::status_store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::status_store(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.sync_all().await.map_err(|e| {
                Error::status_store(format!(
                    "Failed to sync temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::status_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Status written to file: {}", self.path.display());
        Ok(())
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }
}

#[async_trait]
impl StatusStore for FileStatusStore {
    async fn load(&self) -> StatusRecord {
        match self.read_record().await {
            Ok(Some(record)) => {
                tracing::debug!("Loaded status from {}: {}", self.path.display(), record);
                record
            }
            Ok(None) => {
                tracing::debug!(
                    "Status file {} is empty, starting fresh",
                    self.path.display()
                );
                StatusRecord::empty()
            }
            Err(e) => {
                tracing::warn!("Status file unusable, starting fresh: {}", e);
                StatusRecord::empty()
            }
        }
    }

    async fn save(&self, record: &StatusRecord) -> Result<(), Error> {
        self.write_record(record).await
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

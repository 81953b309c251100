//! Durable update record surviving process restarts.
//!
//! The store remembers two facts between runs: the version string of the
//! last fully downloaded artifact and whether that artifact is still waiting
//! to be installed. Each setter is an independent durable write with no
//! cross-field transaction, so a crash between "artifact written" and "flag
//! written" can leave the record ahead of or behind the filesystem. Readers
//! must treat the artifact file itself as the tiebreaker; the orchestrator
//! re-verifies its existence on every cold check.
//!
//! [`JsonFileStore`] is the production implementation: a single JSON file
//! with the record's fields in camelCase, matching the key names in
//! [`constants`](crate::constants). Stores are constructed explicitly and
//! injected into the orchestrator, so tests swap in the in-memory double
//! from `test_utils`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::core::UpdateError;

/// The persisted update record.
///
/// # Serialization
///
/// Stored as camelCase JSON (`lastDownloadedVersion`, `installPending`,
/// `downloadedAt`); unknown or absent fields fall back to defaults so older
/// record files keep loading after upgrades.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRecord {
    /// Version string of the last download that fully completed.
    #[serde(default)]
    pub last_downloaded_version: Option<String>,
    /// Whether a downloaded artifact is still awaiting install.
    ///
    /// `true` only implies an artifact *should* exist at the well-known
    /// path; the flag and the file are written independently and may
    /// desynchronize after a crash.
    #[serde(default)]
    pub install_pending: bool,
    /// When the last download completed. Informational only; transition
    /// logic never consults it.
    #[serde(default)]
    pub downloaded_at: Option<DateTime<Utc>>,
}

/// Durable key/value record store for update state.
///
/// Each setter performs its own durable write; the contract deliberately
/// offers no multi-field transaction, and callers must not assume two
/// consecutive setters are observed atomically after a crash.
pub trait RecordStore: Send + Sync {
    /// Version of the last fully completed download, if any.
    fn last_downloaded_version(
        &self,
    ) -> impl Future<Output = Result<Option<String>, UpdateError>> + Send;

    /// Whether an install is pending. `false` when unset.
    fn install_pending(&self) -> impl Future<Output = Result<bool, UpdateError>> + Send;

    /// Record a completed download. Called only after the artifact is fully
    /// written.
    fn set_last_downloaded_version(
        &self,
        version: &str,
    ) -> impl Future<Output = Result<(), UpdateError>> + Send;

    /// Set or clear the install-pending flag.
    fn set_install_pending(
        &self,
        pending: bool,
    ) -> impl Future<Output = Result<(), UpdateError>> + Send;
}

/// JSON-file-backed record store.
///
/// One file holds the whole [`PersistedRecord`]; every setter re-reads the
/// file, mutates its own field, and writes the result back immediately. The
/// parent directory is created on first write. A missing or empty file reads
/// as the default record.
///
/// # Examples
///
/// ```rust,no_run
/// use updatekit::store::{JsonFileStore, RecordStore};
///
/// # async fn example() -> Result<(), updatekit::core::UpdateError> {
/// let store = JsonFileStore::new("/var/lib/myapp/update-record.json");
/// store.set_last_downloaded_version("2.0.0").await?;
/// store.set_install_pending(true).await?;
/// assert!(store.install_pending().await?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store backed by the JSON file at `path`.
    ///
    /// The file is not touched until the first write; constructing a store
    /// never fails.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a store using the default record file name inside `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join(crate::constants::RECORD_FILE_NAME),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the full record, defaulting when the file does not exist.
    pub async fn load(&self) -> Result<PersistedRecord, UpdateError> {
        match fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(PersistedRecord::default()),
            Ok(content) => {
                serde_json::from_str(&content).map_err(|e| UpdateError::Store {
                    operation: "load record".to_string(),
                    reason: format!("{}: {e}", self.path.display()),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no persisted record yet");
                Ok(PersistedRecord::default())
            }
            Err(e) => Err(UpdateError::Store {
                operation: "load record".to_string(),
                reason: format!("{}: {e}", self.path.display()),
            }),
        }
    }

    async fn save(&self, record: &PersistedRecord) -> Result<(), UpdateError> {
        if let Some(parent) = self.path.parent() {
            crate::utils::fs::ensure_dir(parent)
                .await
                .map_err(|e| UpdateError::Store {
                    operation: "save record".to_string(),
                    reason: e.to_string(),
                })?;
        }

        let content = serde_json::to_string_pretty(record).map_err(|e| UpdateError::Store {
            operation: "save record".to_string(),
            reason: e.to_string(),
        })?;

        fs::write(&self.path, content)
            .await
            .map_err(|e| UpdateError::Store {
                operation: "save record".to_string(),
                reason: format!("{}: {e}", self.path.display()),
            })?;

        debug!(path = %self.path.display(), "persisted update record");
        Ok(())
    }

    async fn update_field(
        &self,
        mutate: impl FnOnce(&mut PersistedRecord),
    ) -> Result<(), UpdateError> {
        let mut record = self.load().await?;
        mutate(&mut record);
        self.save(&record).await
    }
}

impl RecordStore for JsonFileStore {
    async fn last_downloaded_version(&self) -> Result<Option<String>, UpdateError> {
        Ok(self.load().await?.last_downloaded_version)
    }

    async fn install_pending(&self) -> Result<bool, UpdateError> {
        Ok(self.load().await?.install_pending)
    }

    async fn set_last_downloaded_version(&self, version: &str) -> Result<(), UpdateError> {
        let version = version.to_string();
        self.update_field(|record| {
            record.last_downloaded_version = Some(version);
            record.downloaded_at = Some(Utc::now());
        })
        .await
    }

    async fn set_install_pending(&self, pending: bool) -> Result<(), UpdateError> {
        self.update_field(|record| record.install_pending = pending).await
    }
}

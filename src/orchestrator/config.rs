//! Orchestrator configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::ARTIFACT_FILE_NAME;

/// Configuration for an [`UpdateOrchestrator`](super::UpdateOrchestrator).
///
/// Two fields are required and host-supplied: the manifest URL and the
/// version string of the currently running build. Everything else has
/// conservative defaults - check on startup, never download without user
/// confirmation, and place the artifact in the platform downloads directory.
///
/// # Serialization
///
/// Deserializable from a host's config file; omitted optional fields fall
/// back to the same defaults.
///
/// ```json
/// {
///   "updateUrl": "https://example.com/api/latest",
///   "installedVersion": "1.9.0",
///   "autoDownload": true
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConfig {
    /// URL of the version manifest endpoint.
    pub update_url: String,

    /// Version string of the currently running build.
    ///
    /// Compared for equality against the manifest version; any difference
    /// counts as an available update, so rollback releases work without
    /// special casing.
    pub installed_version: String,

    /// Where the artifact is written.
    ///
    /// A single fixed path, overwritten on every download. Defaults to
    /// `update-latest.bin` inside the platform downloads directory.
    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,

    /// Whether [`start`](super::UpdateOrchestrator::start) runs a check
    /// immediately.
    ///
    /// # Default: `true`
    #[serde(default = "default_auto_check")]
    pub auto_check: bool,

    /// Whether an available update is downloaded without waiting for
    /// `trigger_update`.
    ///
    /// When enabled, the flow proceeds from `Available` straight into
    /// `Downloading` as soon as a check detects a new version. The
    /// user-trigger path remains usable either way.
    ///
    /// # Default: `false`
    #[serde(default)]
    pub auto_download: bool,
}

impl UpdateConfig {
    /// Create a config with defaults for everything but the required fields.
    pub fn new(update_url: impl Into<String>, installed_version: impl Into<String>) -> Self {
        Self {
            update_url: update_url.into(),
            installed_version: installed_version.into(),
            artifact_path: default_artifact_path(),
            auto_check: default_auto_check(),
            auto_download: false,
        }
    }

    /// Override the artifact destination path.
    pub fn with_artifact_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact_path = path.into();
        self
    }

    /// Set the auto-check-on-start policy.
    pub fn with_auto_check(mut self, auto_check: bool) -> Self {
        self.auto_check = auto_check;
        self
    }

    /// Set the auto-download policy.
    pub fn with_auto_download(mut self, auto_download: bool) -> Self {
        self.auto_download = auto_download;
        self
    }
}

/// Default artifact destination: the platform downloads directory, falling
/// back to the temp directory on headless systems without one.
fn default_artifact_path() -> PathBuf {
    dirs::download_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(ARTIFACT_FILE_NAME)
}

/// Checks run on startup unless the host opts out.
fn default_auto_check() -> bool {
    true
}

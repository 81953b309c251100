//! Install capability gating and installer handoff.
//!
//! Installing a downloaded artifact is a platform concern: some platforms
//! gate third-party installs behind a user-granted capability, and all of
//! them own the actual install UI. This module models that boundary as the
//! [`InstallGate`] trait with two narrow operations: check/request the
//! capability, and hand the artifact to the platform installer.
//!
//! A capability denial is a value ([`Capability::Denied`]), not an error -
//! it is an expected outcome whose only remediation is the user visiting a
//! system settings screen. The flow's responsibility ends at a successful
//! handoff; no install-completion callback exists on the platforms this
//! models.

use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::core::UpdateError;

/// Outcome of an install capability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Installs are permitted; the flow may hand off to the installer.
    Granted,
    /// The platform (or the user, when prompted) refused the capability.
    ///
    /// Terminal for this attempt: callers surface a settings-navigation
    /// remediation and leave the update pending for a future retry. No
    /// automatic re-request loop.
    Denied,
}

/// Platform permission check and install-trigger delegation.
pub trait InstallGate: Send + Sync {
    /// Check the install capability, requesting it once if absent.
    ///
    /// A no-op `Granted` on platforms that do not gate installs. Errors are
    /// faults in performing the check itself, not denials.
    fn ensure_install_capability(
        &self,
    ) -> impl Future<Output = Result<Capability, UpdateError>> + Send;

    /// Hand the artifact at `path` to the platform's installer entry point.
    ///
    /// Returns once the handoff succeeds; install completion is never
    /// reported back. Failure (missing file, launch error) must leave the
    /// caller free to retry - in particular the persisted install-pending
    /// flag stays set.
    fn launch_install(&self, path: &Path)
    -> impl Future<Output = Result<(), UpdateError>> + Send;
}

/// Default gate for desktop platforms.
///
/// Desktop OSes do not gate package-installer launches behind a runtime
/// capability, so the check is a no-op grant. The handoff opens the artifact
/// with the platform's default opener (`xdg-open`, `open`, or `cmd /C
/// start`), which routes it to the registered installer. The spawned opener
/// is not awaited - the subsystem's involvement ends at the handoff.
///
/// Gated platforms supply their own [`InstallGate`] implementation wired to
/// the platform permission API.
#[derive(Debug, Clone, Default)]
pub struct PlatformInstallGate;

impl PlatformInstallGate {
    /// Create the default platform gate.
    pub fn new() -> Self {
        Self
    }

    fn opener(path: &Path) -> Command {
        if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.arg(path);
            cmd
        } else if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg("start").arg("").arg(path);
            cmd
        } else {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(path);
            cmd
        }
    }
}

impl InstallGate for PlatformInstallGate {
    async fn ensure_install_capability(&self) -> Result<Capability, UpdateError> {
        debug!("install capability not gated on this platform");
        Ok(Capability::Granted)
    }

    async fn launch_install(&self, path: &Path) -> Result<(), UpdateError> {
        let exists = tokio::fs::try_exists(path).await.unwrap_or(false);
        if !exists {
            warn!(path = %path.display(), "artifact missing at install time");
            return Err(UpdateError::Install {
                path: path.display().to_string(),
                reason: "artifact file does not exist".to_string(),
            });
        }

        let mut command = Self::opener(path);
        command.spawn().map_err(|e| UpdateError::Install {
            path: path.display().to_string(),
            reason: format!("failed to launch platform installer: {e}"),
        })?;

        info!(path = %path.display(), "artifact handed to platform installer");
        Ok(())
    }
}

//! The orchestrator driving the update lifecycle.

use std::path::Path;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::constants::SETTINGS_REMEDIATION;
use crate::core::{FailureKind, UpdateError};
use crate::download::{ArtifactDownloader, DownloadProgress};
use crate::install::{Capability, InstallGate};
use crate::manifest::{ManifestSource, RemoteManifest};
use crate::store::RecordStore;

use super::config::UpdateConfig;
use super::state::{Notice, UpdatePhase, UpdateState};

/// The update lifecycle state machine.
///
/// Owns the flow end to end: it is the only writer of the published
/// [`UpdateState`] and the only caller of the record store's setters.
/// Construct one per application; the host keeps it alive for the process
/// lifetime and calls the three public operations from its UI layer.
///
/// # Public operations
///
/// - [`check_for_update`](Self::check_for_update) - fetch the manifest and
///   reconcile it with persisted and filesystem state
/// - [`trigger_update`](Self::trigger_update) - download the offered
///   artifact
/// - [`trigger_install`](Self::trigger_install) - gate-check and hand the
///   artifact to the platform installer
///
/// Plus [`start`](Self::start), which runs the startup check when
/// `auto_check` is configured.
///
/// # Failure behavior
///
/// Update-taxonomy failures (network, download, install) never propagate as
/// `Err`: they publish a transient `Failed` phase with a [`Notice`] and
/// revert to the nearest retryable phase. `Err` returns are reserved for
/// environment faults - a persisted store that cannot be read or written.
///
/// # Examples
///
/// ```rust,no_run
/// use updatekit::download::HttpArtifactDownloader;
/// use updatekit::install::PlatformInstallGate;
/// use updatekit::manifest::HttpManifestClient;
/// use updatekit::orchestrator::{UpdateConfig, UpdateOrchestrator, UpdatePhase};
/// use updatekit::store::JsonFileStore;
///
/// # async fn example() -> Result<(), updatekit::core::UpdateError> {
/// let orchestrator = UpdateOrchestrator::new(
///     UpdateConfig::new("https://example.com/api/latest", env!("CARGO_PKG_VERSION")),
///     HttpManifestClient::new()?,
///     JsonFileStore::new("update-record.json"),
///     HttpArtifactDownloader::new()?,
///     PlatformInstallGate::new(),
/// );
///
/// orchestrator.check_for_update().await?;
/// if orchestrator.snapshot().phase == UpdatePhase::Available {
///     orchestrator.trigger_update().await?;
/// }
/// # Ok(())
/// # }
/// ```
pub struct UpdateOrchestrator<M, S, D, G>
where
    M: ManifestSource,
    S: RecordStore,
    D: ArtifactDownloader,
    G: InstallGate,
{
    config: UpdateConfig,
    manifest_source: M,
    store: S,
    downloader: D,
    gate: G,
    state: watch::Sender<UpdateState>,
}

impl<M, S, D, G> UpdateOrchestrator<M, S, D, G>
where
    M: ManifestSource,
    S: RecordStore,
    D: ArtifactDownloader,
    G: InstallGate,
{
    /// Compose an orchestrator from its four components.
    ///
    /// The components are owned for the orchestrator's lifetime; the store
    /// in particular must not be written by anything else while the
    /// orchestrator is alive.
    pub fn new(config: UpdateConfig, manifest_source: M, store: S, downloader: D, gate: G) -> Self {
        let (state, _) = watch::channel(UpdateState::default());
        Self {
            config,
            manifest_source,
            store,
            downloader,
            gate,
            state,
        }
    }

    /// The configuration this orchestrator was built with.
    pub fn config(&self) -> &UpdateConfig {
        &self.config
    }

    /// Latest published state, pull-based.
    pub fn snapshot(&self) -> UpdateState {
        self.state.borrow().clone()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> UpdatePhase {
        self.state.borrow().phase
    }

    /// Subscribe to state changes, push-based.
    ///
    /// The receiver observes latest-wins snapshots; rapid transitions (the
    /// transient `Failed` phase in particular) may be coalesced.
    pub fn subscribe(&self) -> watch::Receiver<UpdateState> {
        self.state.subscribe()
    }

    /// Consume the pending one-shot notice, if any.
    ///
    /// Presentation layers call this after rendering a notification so it is
    /// shown exactly once.
    pub fn take_notice(&self) -> Option<Notice> {
        let mut taken = None;
        self.state.send_if_modified(|state| {
            taken = state.last_notice.take();
            taken.is_some()
        });
        taken
    }

    /// Run the startup check when `auto_check` is configured.
    pub async fn start(&self) -> Result<(), UpdateError> {
        if self.config.auto_check {
            self.check_for_update().await
        } else {
            debug!("auto check disabled; waiting for an explicit check");
            Ok(())
        }
    }

    /// Check the manifest endpoint and reconcile the flow's phase.
    ///
    /// Ignored (no-op) while a check or download is already in flight.
    /// Outcomes:
    ///
    /// - fetch/parse failure: transient `Failed(Network)` with a
    ///   [`Notice::CheckFailed`], then `Idle`
    /// - remote version equals the installed version: `Idle` (not an error)
    /// - new version whose artifact was already fully downloaded and still
    ///   exists on disk: straight to `PendingInstall`, skipping the download
    /// - new version otherwise: `Available` with the manifest retained; with
    ///   `auto_download` configured the download starts immediately
    ///
    /// # Errors
    ///
    /// Only store faults propagate; the phase is reverted to `Idle` first.
    pub async fn check_for_update(&self) -> Result<(), UpdateError> {
        let entered = self.transition(
            |phase| !phase.in_flight() && phase != UpdatePhase::Installing,
            |state| state.phase = UpdatePhase::Checking,
        );
        if !entered {
            debug!(phase = ?self.phase(), "check ignored; flow busy");
            return Ok(());
        }

        info!(url = %self.config.update_url, "checking for update");
        let manifest = match self
            .manifest_source
            .fetch_manifest(&self.config.update_url)
            .await
        {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(error = %e, "update check failed");
                self.fail_and_revert(
                    FailureKind::Network,
                    UpdatePhase::Idle,
                    Notice::CheckFailed {
                        reason: e.to_string(),
                    },
                );
                return Ok(());
            }
        };

        if manifest.version == self.config.installed_version {
            debug!(version = %manifest.version, "already on the latest version");
            self.publish(|state| {
                state.phase = UpdatePhase::Idle;
                state.manifest = None;
            });
            return Ok(());
        }

        let resume_pending = match self.downloaded_artifact_is_current(&manifest).await {
            Ok(resume) => resume,
            Err(e) => {
                // Store faults are environment problems, not update failures;
                // reset the phase and let the caller see the error.
                self.publish(|state| state.phase = UpdatePhase::Idle);
                return Err(e);
            }
        };

        if resume_pending {
            info!(version = %manifest.version, "artifact already downloaded; resuming pending install");
            self.publish(|state| {
                state.phase = UpdatePhase::PendingInstall;
                state.manifest = Some(manifest);
            });
            return Ok(());
        }

        info!(version = %manifest.version, "update available");
        self.publish(|state| {
            state.phase = UpdatePhase::Available;
            state.manifest = Some(manifest);
        });

        if self.config.auto_download {
            debug!("auto download enabled; starting download");
            return self.trigger_update().await;
        }
        Ok(())
    }

    /// Download the offered artifact.
    ///
    /// A no-op unless the phase is `Available`; in particular a second call
    /// while `Downloading` is ignored, not queued. Progress resets to zero at
    /// the start of the attempt and is published monotonically as the stream
    /// proceeds.
    ///
    /// On success the store records the downloaded version and sets the
    /// install-pending flag (two independent durable writes, in that order),
    /// and the phase becomes `PendingInstall`. On download failure the phase
    /// reverts to `Available` with a [`Notice::DownloadFailed`]; the manifest
    /// is retained so a retry needs no fresh check.
    ///
    /// # Errors
    ///
    /// Only store faults propagate; the downloaded artifact stays on disk
    /// and the phase reverts to `Available` so the flow remains retryable.
    pub async fn trigger_update(&self) -> Result<(), UpdateError> {
        let mut offered = None;
        self.transition(
            |phase| phase == UpdatePhase::Available,
            |state| {
                offered = state.manifest.clone();
                state.phase = UpdatePhase::Downloading;
                state.progress = DownloadProgress::default();
            },
        );
        let Some(manifest) = offered else {
            debug!(phase = ?self.phase(), "trigger_update ignored; no update offered");
            return Ok(());
        };

        info!(version = %manifest.version, url = %manifest.artifact_url, "downloading update artifact");

        let progress_state = self.state.clone();
        let on_progress = move |progress: DownloadProgress| {
            progress_state.send_if_modified(|state| {
                // Latest-wins snapshot, kept monotone within the attempt.
                if progress.bytes_written >= state.progress.bytes_written {
                    state.progress = progress;
                    true
                } else {
                    false
                }
            });
        };

        let downloaded = self
            .downloader
            .download(
                &manifest.artifact_url,
                &self.config.artifact_path,
                &on_progress,
            )
            .await;

        match downloaded {
            Ok(()) => {
                if let Err(e) = self.record_completed_download(&manifest).await {
                    warn!(error = %e, "download finished but the record store failed");
                    self.publish(|state| state.phase = UpdatePhase::Available);
                    return Err(e);
                }
                info!(version = %manifest.version, "download complete; install pending");
                self.publish(|state| state.phase = UpdatePhase::PendingInstall);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "artifact download failed");
                self.fail_and_revert(
                    FailureKind::Download,
                    UpdatePhase::Available,
                    Notice::DownloadFailed {
                        reason: e.to_string(),
                    },
                );
                Ok(())
            }
        }
    }

    /// Gate-check and hand the downloaded artifact to the platform installer.
    ///
    /// A no-op unless the phase is `PendingInstall`. The capability check
    /// runs first; a denial publishes [`Notice::PermissionDenied`] with the
    /// settings remediation and leaves the phase at `PendingInstall` without
    /// ever invoking the installer. After a successful handoff the phase is
    /// `Installing` and this subsystem's involvement ends; the persisted
    /// install-pending flag intentionally stays set until a later check
    /// observes the remote version moving on.
    pub async fn trigger_install(&self) -> Result<(), UpdateError> {
        if self.phase() != UpdatePhase::PendingInstall {
            debug!(phase = ?self.phase(), "trigger_install ignored; no install pending");
            return Ok(());
        }

        match self.gate.ensure_install_capability().await {
            Ok(Capability::Granted) => {}
            Ok(Capability::Denied) => {
                warn!("install capability denied");
                self.publish(|state| {
                    state.last_notice = Some(Notice::PermissionDenied {
                        remediation: SETTINGS_REMEDIATION.to_string(),
                    });
                });
                return Ok(());
            }
            Err(UpdateError::PermissionDenied { remediation }) => {
                warn!("install capability denied");
                self.publish(|state| {
                    state.last_notice = Some(Notice::PermissionDenied { remediation });
                });
                return Ok(());
            }
            Err(e) => {
                warn!(error = %e, "install capability check failed");
                self.fail_and_revert(
                    FailureKind::Install,
                    UpdatePhase::PendingInstall,
                    Notice::InstallFailed {
                        reason: e.to_string(),
                    },
                );
                return Ok(());
            }
        }

        let entered = self.transition(
            |phase| phase == UpdatePhase::PendingInstall,
            |state| state.phase = UpdatePhase::Installing,
        );
        if !entered {
            return Ok(());
        }

        match self.gate.launch_install(&self.config.artifact_path).await {
            Ok(()) => {
                info!(path = %self.config.artifact_path.display(), "installer launched");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "installer launch failed");
                self.fail_and_revert(
                    FailureKind::Install,
                    UpdatePhase::PendingInstall,
                    Notice::InstallFailed {
                        reason: e.to_string(),
                    },
                );
                Ok(())
            }
        }
    }

    /// Decide whether a check can resume straight into `PendingInstall`.
    ///
    /// True only when the persisted record matches the offered version, the
    /// pending flag is set, and the artifact file actually exists - the
    /// filesystem is the tiebreaker for a record that desynchronized in a
    /// crash. As a side effect, a pending flag left behind by a version the
    /// server no longer offers is cleared.
    async fn downloaded_artifact_is_current(
        &self,
        manifest: &RemoteManifest,
    ) -> Result<bool, UpdateError> {
        let last_downloaded = self.store.last_downloaded_version().await?;
        let pending = self.store.install_pending().await?;
        let version_matches = last_downloaded.as_deref() == Some(manifest.version.as_str());

        if version_matches && pending && file_exists(&self.config.artifact_path).await {
            return Ok(true);
        }

        if pending && !version_matches {
            debug!(
                stale = ?last_downloaded,
                offered = %manifest.version,
                "clearing stale install-pending flag"
            );
            self.store.set_install_pending(false).await?;
        }

        Ok(false)
    }

    /// Record a fully completed download: version first, then the flag.
    async fn record_completed_download(&self, manifest: &RemoteManifest) -> Result<(), UpdateError> {
        self.store
            .set_last_downloaded_version(&manifest.version)
            .await?;
        self.store.set_install_pending(true).await
    }

    /// Apply a guarded phase transition. Returns whether it was taken.
    fn transition(
        &self,
        allowed: impl Fn(UpdatePhase) -> bool,
        apply: impl FnOnce(&mut UpdateState),
    ) -> bool {
        self.state.send_if_modified(|state| {
            if allowed(state.phase) {
                apply(state);
                true
            } else {
                false
            }
        })
    }

    /// Publish a state mutation unconditionally.
    fn publish(&self, apply: impl FnOnce(&mut UpdateState)) {
        self.state.send_modify(apply);
    }

    /// Publish the transient `Failed` phase with its notice, then revert.
    fn fail_and_revert(&self, kind: FailureKind, revert_to: UpdatePhase, notice: Notice) {
        self.state.send_modify(|state| {
            state.phase = UpdatePhase::Failed(kind);
            state.last_notice = Some(notice);
        });
        self.state.send_modify(|state| state.phase = revert_to);
    }
}

async fn file_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

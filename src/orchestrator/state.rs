//! Observable state published by the orchestrator.

use crate::core::FailureKind;
use crate::download::DownloadProgress;
use crate::manifest::RemoteManifest;

/// The orchestrator's position in the update lifecycle.
///
/// The single source of truth for what a presentation layer renders. Derived
/// from the persisted record, the filesystem, and in-memory download state;
/// never stored verbatim.
///
/// `Failed` is transient: it is published together with its notice, then the
/// flow immediately reverts to the nearest retryable phase (`Idle` after a
/// failed check, `Available` after a failed download, `PendingInstall` after
/// a failed install). Pull-based observers will usually see only the
/// reverted phase plus the notice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdatePhase {
    /// No update activity; the initial phase.
    #[default]
    Idle,
    /// A manifest fetch is in flight. Further checks are coalesced.
    Checking,
    /// A different remote version exists and its manifest is retained.
    Available,
    /// The artifact download is in flight. Further triggers are coalesced.
    Downloading,
    /// A fully downloaded artifact awaits the install trigger.
    PendingInstall,
    /// The artifact was handed to the platform installer. Quiescent terminal
    /// point of the flow; no completion callback is modeled.
    Installing,
    /// A failure occurred; see the accompanying [`Notice`].
    Failed(FailureKind),
}

impl UpdatePhase {
    /// Whether an asynchronous operation is currently in flight.
    pub fn in_flight(&self) -> bool {
        matches!(self, Self::Checking | Self::Downloading)
    }
}

/// One-shot user-facing notification.
///
/// Failures never crash the flow; they surface here, latest-wins, for the
/// presentation layer to render once. [`PermissionDenied`](Self::PermissionDenied)
/// carries the settings-navigation remediation, the only recovery path for a
/// denied install capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The manifest fetch or parse failed; the flow reverted to `Idle`.
    CheckFailed {
        /// Human-readable failure description
        reason: String,
    },
    /// The artifact download failed; the flow reverted to `Available`.
    DownloadFailed {
        /// Human-readable failure description
        reason: String,
    },
    /// The install capability was denied; the flow stays at `PendingInstall`.
    PermissionDenied {
        /// Recovery action to surface alongside the denial
        remediation: String,
    },
    /// The installer launch failed; the flow reverted to `PendingInstall`.
    InstallFailed {
        /// Human-readable failure description
        reason: String,
    },
}

/// Snapshot of everything a presentation layer needs.
///
/// Published through the orchestrator's watch channel; clone-cheap and
/// latest-wins. `manifest` is populated from `Available` onward and cleared
/// when a check concludes no update exists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateState {
    /// Current lifecycle phase
    pub phase: UpdatePhase,
    /// Progress of the current (or last) download attempt
    pub progress: DownloadProgress,
    /// Manifest of the update being offered, once known
    pub manifest: Option<RemoteManifest>,
    /// Most recent one-shot notification, if unconsumed
    pub last_notice: Option<Notice>,
}

//! Error handling for updatekit.
//!
//! The error system is built around two types:
//!
//! - [`UpdateError`] - strongly-typed error variants for every failure mode
//!   in the update flow, with named context fields
//! - [`FailureKind`] - the coarse classification published in the
//!   orchestrator's `Failed` phase
//!
//! # Design
//!
//! Components return the precise variant for their failure: the manifest
//! client distinguishes a transport failure ([`UpdateError::Network`]) from a
//! malformed response body ([`UpdateError::ManifestParse`]) so logs can tell
//! the two apart, even though both collapse to [`FailureKind::Network`] for
//! the state machine. None of the variants abort the orchestrator; every
//! failure reverts the flow to its nearest retryable phase.
//!
//! # Examples
//!
//! ```rust
//! use updatekit::core::{FailureKind, UpdateError};
//!
//! let err = UpdateError::Download {
//!     url: "https://example.com/app.bin".to_string(),
//!     reason: "connection reset".to_string(),
//! };
//! assert_eq!(err.failure_kind(), Some(FailureKind::Download));
//! ```

use thiserror::Error;

/// The main error type for updatekit operations.
///
/// Each variant carries the context needed to produce a useful log line:
/// the operation or resource involved plus the underlying reason. Variants
/// map onto [`FailureKind`] via [`UpdateError::failure_kind`]; errors outside
/// the update taxonomy (store and raw I/O faults) have no kind and are
/// propagated to the caller instead of being absorbed into a phase.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// Network transport failure during a manifest fetch.
    ///
    /// Covers connection errors, timeouts, and non-success HTTP statuses.
    /// Distinct from [`ManifestParse`](UpdateError::ManifestParse) so logs
    /// can separate "the server was unreachable" from "the server answered
    /// garbage".
    #[error("Network error during {operation}: {reason}")]
    Network {
        /// The network operation that failed (e.g., "manifest fetch")
        operation: String,
        /// Reason for the network failure
        reason: String,
    },

    /// Manifest response body did not match the expected envelope.
    ///
    /// The manifest endpoint must answer
    /// `{ "data": { "version": ..., "artifactUrl": ... } }`; a missing field
    /// or any other shape is a parse failure.
    #[error("Invalid manifest response: {reason}")]
    ManifestParse {
        /// Why the body could not be interpreted as a manifest
        reason: String,
    },

    /// Artifact transfer failed.
    ///
    /// The partially written file is left in place; a fresh download attempt
    /// overwrites it.
    #[error("Download failed for {url}: {reason}")]
    Download {
        /// The artifact URL being fetched
        url: String,
        /// Reason for the transfer failure
        reason: String,
    },

    /// The platform refused the install capability.
    ///
    /// Terminal for the attempt; there is no programmatic retry. The
    /// remediation text directs the user to the system settings screen.
    #[error("Install permission denied: {remediation}")]
    PermissionDenied {
        /// Recovery action to surface to the user
        remediation: String,
    },

    /// Handoff to the platform installer failed.
    ///
    /// Covers a missing artifact file and installer launch errors. The
    /// persisted install-pending flag is left set so the user can retry.
    #[error("Installer launch failed for {path}: {reason}")]
    Install {
        /// Path of the artifact that was being installed
        path: String,
        /// Reason for the launch failure
        reason: String,
    },

    /// Persistent record store operation failed.
    #[error("Record store error during {operation}: {reason}")]
    Store {
        /// The store operation that failed (e.g., "load record")
        operation: String,
        /// Reason for the store failure
        reason: String,
    },

    /// I/O error from [`std::io::Error`]
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl UpdateError {
    /// Classify this error for the orchestrator's `Failed` phase.
    ///
    /// Returns `None` for faults that never surface as a `Failed` phase:
    /// store and raw I/O errors are propagated to the caller, and a
    /// capability denial keeps the flow at `PendingInstall` rather than
    /// failing it.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Network { .. } | Self::ManifestParse { .. } => Some(FailureKind::Network),
            Self::Download { .. } => Some(FailureKind::Download),
            Self::Install { .. } => Some(FailureKind::Install),
            Self::PermissionDenied { .. } | Self::Store { .. } | Self::Io(_) => None,
        }
    }
}

/// Coarse failure classification carried by the `Failed` update phase.
///
/// The presentation layer keys its one-shot failure notifications off this
/// kind; the precise cause lives in the corresponding [`UpdateError`] and in
/// the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Manifest fetch or parse failed; flow reverted to `Idle`.
    Network,
    /// Artifact download failed; flow reverted to `Available`.
    Download,
    /// Installer launch failed; flow reverted to `PendingInstall`.
    Install,
}

//! The update lifecycle state machine.
//!
//! This module composes the four components (manifest source, record store,
//! artifact downloader, install gate) into [`UpdateOrchestrator`], the single
//! owner of the update flow. The orchestrator reconciles three sources of
//! truth - the remote manifest, the persisted record, and the filesystem -
//! into one [`UpdatePhase`] that presentation layers render.
//!
//! # Components
//!
//! - [`UpdateConfig`] - host-supplied configuration (manifest URL, installed
//!   version, artifact path, auto-check/auto-download policy)
//! - [`UpdateState`] - the observable snapshot: phase, progress, manifest,
//!   last notice
//! - [`UpdateOrchestrator`] - the state machine driving the three public
//!   operations: `check_for_update`, `trigger_update`, `trigger_install`
//!
//! # Crash Consistency
//!
//! The persisted record's two fields are written independently, so after a
//! crash the record may claim an install is pending while the artifact file
//! is gone (or the reverse). The orchestrator never trusts the flags alone:
//! every check re-verifies the artifact file's existence, and only the
//! combination of matching version, pending flag, and present file resumes
//! directly into `PendingInstall`. Anything else falls back to the normal
//! `Available` path and re-downloads.
//!
//! # Concurrency
//!
//! One orchestrator instance runs one logical flow. The published phase
//! doubles as the in-flight guard: `check_for_update` while `Checking` and
//! `trigger_update` while `Downloading` are ignored no-ops, not queued. All
//! store writes happen inside transition logic.

pub mod config;
pub mod machine;
pub mod state;

pub use config::UpdateConfig;
pub use machine::UpdateOrchestrator;
pub use state::{Notice, UpdatePhase, UpdateState};

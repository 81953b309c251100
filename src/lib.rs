//! Updatekit - client-side update lifecycle
//!
//! Updatekit is the logic layer of a self-updating application: given a
//! manifest URL it determines whether a newer build is available, streams the
//! corresponding artifact to local storage with progress reporting, and hands
//! the downloaded artifact off to the platform's installer. The whole flow is
//! modeled as an explicit state machine so a process that is killed
//! mid-download or mid-install resumes in a consistent phase on the next
//! start instead of re-downloading or losing track of a pending install.
//!
//! # Architecture Overview
//!
//! The crate is built from five components, composed by the orchestrator:
//!
//! - [`manifest`] - fetches and parses the remote version manifest
//! - [`store`] - durable key/value record surviving restarts (last downloaded
//!   version, install-pending flag)
//! - [`download`] - streams the artifact to a fixed path, reporting progress
//! - [`install`] - platform capability check and installer handoff
//! - [`orchestrator`] - the update lifecycle state machine tying it together
//!
//! Each component sits behind a narrow trait so hosts and tests can
//! substitute their own transport, store, or install mechanism. The
//! production implementations use `reqwest` for HTTP and a JSON file for the
//! persisted record.
//!
//! # Update Lifecycle
//!
//! ```text
//! Idle --check_for_update()--> Checking
//!   ├── fetch failed            -> Failed(Network) -> Idle
//!   ├── same version            -> Idle
//!   ├── new version, artifact
//!   │   already downloaded      -> PendingInstall   (cold-start resume)
//!   └── new version             -> Available
//!
//! Available --trigger_update() or auto_download--> Downloading
//!   ├── success -> record version + pending flag -> PendingInstall
//!   └── failure -> Failed(Download) -> Available  (retry without re-check)
//!
//! PendingInstall --trigger_install()--> Installing
//!   ├── capability denied -> stays PendingInstall (settings remediation)
//!   └── launch failed     -> Failed(Install) -> PendingInstall
//! ```
//!
//! `Installing` is the quiescent terminal point of the flow: the artifact has
//! been handed to the platform installer and no completion callback is
//! modeled.
//!
//! # Observing State
//!
//! The orchestrator publishes [`orchestrator::UpdateState`] snapshots through
//! a `tokio::sync::watch` channel. Presentation layers either pull the latest
//! snapshot with [`orchestrator::UpdateOrchestrator::snapshot`] or subscribe
//! for change notifications with
//! [`orchestrator::UpdateOrchestrator::subscribe`]. Progress updates are
//! latest-wins snapshots, not a delivery-guaranteed stream.
//!
//! # Example
//!
//! ```rust,no_run
//! use updatekit::download::HttpArtifactDownloader;
//! use updatekit::install::PlatformInstallGate;
//! use updatekit::manifest::HttpManifestClient;
//! use updatekit::orchestrator::{UpdateConfig, UpdateOrchestrator};
//! use updatekit::store::JsonFileStore;
//!
//! # async fn example() -> Result<(), updatekit::core::UpdateError> {
//! let config = UpdateConfig::new("https://example.com/api/latest", "1.9.0");
//! let orchestrator = UpdateOrchestrator::new(
//!     config,
//!     HttpManifestClient::new()?,
//!     JsonFileStore::new("/var/lib/myapp/update-record.json"),
//!     HttpArtifactDownloader::new()?,
//!     PlatformInstallGate::new(),
//! );
//!
//! orchestrator.start().await?;
//! println!("phase: {:?}", orchestrator.snapshot().phase);
//! # Ok(())
//! # }
//! ```

// Core functionality modules
pub mod constants;
pub mod core;
pub mod orchestrator;

// Components composed by the orchestrator
pub mod download;
pub mod install;
pub mod manifest;
pub mod store;

// Supporting modules
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

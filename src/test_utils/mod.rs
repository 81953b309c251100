//! Component doubles for unit and integration tests.
//!
//! Each double implements one of the orchestrator's component traits with
//! scripted behavior and call counters. The doubles are `Clone` with shared
//! innards so a test can keep a handle for assertions after handing the
//! double to the orchestrator.
//!
//! Pausable doubles gate on a [`tokio::sync::Semaphore`]: the double
//! acquires (and consumes) a permit at its pause point, so a test releases
//! it by adding a permit. This makes in-flight phases observable without
//! sleeps.

use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;

use crate::core::UpdateError;
use crate::download::{ArtifactDownloader, DownloadProgress, ProgressFn};
use crate::install::{Capability, InstallGate};
use crate::manifest::{ManifestSource, RemoteManifest};
use crate::store::{PersistedRecord, RecordStore};

/// In-memory [`RecordStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    record: Arc<Mutex<PersistedRecord>>,
}

impl MemoryStore {
    /// Empty store: no version, no pending install.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a record, as if left by an earlier run.
    pub fn with_record(record: PersistedRecord) -> Self {
        Self {
            record: Arc::new(Mutex::new(record)),
        }
    }

    /// Snapshot of the current record.
    pub fn record(&self) -> PersistedRecord {
        self.record.lock().unwrap().clone()
    }
}

impl RecordStore for MemoryStore {
    async fn last_downloaded_version(&self) -> Result<Option<String>, UpdateError> {
        Ok(self.record.lock().unwrap().last_downloaded_version.clone())
    }

    async fn install_pending(&self) -> Result<bool, UpdateError> {
        Ok(self.record.lock().unwrap().install_pending)
    }

    async fn set_last_downloaded_version(&self, version: &str) -> Result<(), UpdateError> {
        let mut record = self.record.lock().unwrap();
        record.last_downloaded_version = Some(version.to_string());
        record.downloaded_at = Some(Utc::now());
        Ok(())
    }

    async fn set_install_pending(&self, pending: bool) -> Result<(), UpdateError> {
        self.record.lock().unwrap().install_pending = pending;
        Ok(())
    }
}

/// Scripted [`ManifestSource`].
#[derive(Clone)]
pub struct StubManifestClient {
    manifest: Option<RemoteManifest>,
    pause: Option<Arc<Semaphore>>,
    calls: Arc<AtomicUsize>,
}

impl StubManifestClient {
    /// Always serves the given manifest.
    pub fn serving(manifest: RemoteManifest) -> Self {
        Self {
            manifest: Some(manifest),
            pause: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always fails with a network error.
    pub fn unreachable() -> Self {
        Self {
            manifest: None,
            pause: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Serves the manifest, but each fetch blocks until the semaphore gets
    /// a permit. Lets tests observe the `Checking` phase.
    pub fn serving_paused(manifest: RemoteManifest, pause: Arc<Semaphore>) -> Self {
        Self {
            manifest: Some(manifest),
            pause: Some(pause),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of fetches performed.
    pub fn fetch_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ManifestSource for StubManifestClient {
    async fn fetch_manifest(&self, url: &str) -> Result<RemoteManifest, UpdateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(pause) = &self.pause {
            pause.acquire().await.unwrap().forget();
        }
        match &self.manifest {
            Some(manifest) => Ok(manifest.clone()),
            None => Err(UpdateError::Network {
                operation: "manifest fetch".to_string(),
                reason: format!("scripted failure for {url}"),
            }),
        }
    }
}

/// Scripted [`ArtifactDownloader`].
///
/// Emits a fixed sequence of progress events, optionally pausing before one
/// of them, then either writes a payload to the destination (success) or
/// returns a download error.
#[derive(Clone)]
pub struct ScriptedDownloader {
    events: Arc<Vec<DownloadProgress>>,
    payload: Arc<Vec<u8>>,
    fail: bool,
    pause_before: Option<(usize, Arc<Semaphore>)>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedDownloader {
    fn new(events: &[(u64, u64)], fail: bool) -> Self {
        Self {
            events: Arc::new(
                events
                    .iter()
                    .map(|&(bytes_written, total_bytes)| DownloadProgress {
                        bytes_written,
                        total_bytes,
                    })
                    .collect(),
            ),
            payload: Arc::new(b"scripted artifact payload".to_vec()),
            fail: false,
            pause_before: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
        .with_fail(fail)
    }

    fn with_fail(mut self, fail: bool) -> Self {
        self.fail = fail;
        self
    }

    /// Emits the events then writes the payload and succeeds.
    pub fn succeeding(events: &[(u64, u64)]) -> Self {
        Self::new(events, false)
    }

    /// Emits the events then fails, leaving no complete artifact behind.
    pub fn failing(events: &[(u64, u64)]) -> Self {
        Self::new(events, true)
    }

    /// Pause before emitting the event at `index` (0 pauses immediately)
    /// until the semaphore gets a permit.
    pub fn paused_before(mut self, index: usize, pause: Arc<Semaphore>) -> Self {
        self.pause_before = Some((index, pause));
        self
    }

    /// Number of download attempts.
    pub fn download_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ArtifactDownloader for ScriptedDownloader {
    async fn download(
        &self,
        url: &str,
        dest: &Path,
        on_progress: &ProgressFn,
    ) -> Result<(), UpdateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        for (index, event) in self.events.iter().enumerate() {
            if let Some((pause_index, pause)) = &self.pause_before {
                if index == *pause_index {
                    pause.acquire().await.unwrap().forget();
                }
            }
            on_progress(*event);
        }

        if self.fail {
            return Err(UpdateError::Download {
                url: url.to_string(),
                reason: "scripted failure".to_string(),
            });
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &*self.payload).await?;
        Ok(())
    }
}

/// Scripted [`InstallGate`].
#[derive(Clone)]
pub struct StubInstallGate {
    capability: Capability,
    launch_fails: bool,
    capability_checks: Arc<AtomicUsize>,
    launches: Arc<AtomicUsize>,
}

impl StubInstallGate {
    fn new(capability: Capability, launch_fails: bool) -> Self {
        Self {
            capability,
            launch_fails,
            capability_checks: Arc::new(AtomicUsize::new(0)),
            launches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Grants the capability and launches successfully.
    pub fn granting() -> Self {
        Self::new(Capability::Granted, false)
    }

    /// Denies the capability.
    pub fn denying() -> Self {
        Self::new(Capability::Denied, false)
    }

    /// Grants the capability but fails the installer launch.
    pub fn failing_launch() -> Self {
        Self::new(Capability::Granted, true)
    }

    /// Number of capability checks performed.
    pub fn capability_check_count(&self) -> usize {
        self.capability_checks.load(Ordering::SeqCst)
    }

    /// Number of installer launches attempted.
    pub fn launch_count(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

impl InstallGate for StubInstallGate {
    async fn ensure_install_capability(&self) -> Result<Capability, UpdateError> {
        self.capability_checks.fetch_add(1, Ordering::SeqCst);
        Ok(self.capability)
    }

    async fn launch_install(&self, path: &Path) -> Result<(), UpdateError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        if self.launch_fails {
            return Err(UpdateError::Install {
                path: path.display().to_string(),
                reason: "scripted failure".to_string(),
            });
        }
        Ok(())
    }
}

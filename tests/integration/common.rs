//! Shared helpers for the integration suite.

use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;
use updatekit::manifest::RemoteManifest;
use updatekit::orchestrator::{UpdateConfig, UpdateOrchestrator, UpdateState};

/// Installed version used across the suite.
pub const INSTALLED: &str = "1.9.0";

/// The manifest most scenarios serve: one version ahead of [`INSTALLED`].
pub fn manifest_v2() -> RemoteManifest {
    RemoteManifest {
        version: "2.0.0".to_string(),
        artifact_url: "https://x/app.bin".to_string(),
    }
}

/// Artifact path inside a test's scratch directory.
pub fn artifact_path(dir: &TempDir) -> PathBuf {
    dir.path().join("update-latest.bin")
}

/// Config pointing at the scratch directory, with auto behaviors off so
/// tests drive every transition explicitly.
pub fn config_in(dir: &TempDir) -> UpdateConfig {
    UpdateConfig::new("https://example.com/api/latest", INSTALLED)
        .with_artifact_path(artifact_path(dir))
        .with_auto_check(false)
}

/// Wait (bounded) until the published state satisfies the predicate.
pub async fn wait_for_state(
    rx: &mut tokio::sync::watch::Receiver<UpdateState>,
    predicate: impl FnMut(&UpdateState) -> bool,
) -> UpdateState {
    let state = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for state")
        .expect("state channel closed");
    state.clone()
}

/// Route library logs through the test harness, honoring `RUST_LOG`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Shorthand for composing an orchestrator from doubles.
pub fn orchestrator<M, S, D, G>(
    config: UpdateConfig,
    manifest: M,
    store: S,
    downloader: D,
    gate: G,
) -> UpdateOrchestrator<M, S, D, G>
where
    M: updatekit::manifest::ManifestSource,
    S: updatekit::store::RecordStore,
    D: updatekit::download::ArtifactDownloader,
    G: updatekit::install::InstallGate,
{
    init_tracing();
    UpdateOrchestrator::new(config, manifest, store, downloader, gate)
}

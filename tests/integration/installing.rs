//! Install gating and handoff flows.

use tempfile::TempDir;

use updatekit::orchestrator::{Notice, UpdatePhase};
use updatekit::store::PersistedRecord;
use updatekit::test_utils::{MemoryStore, ScriptedDownloader, StubInstallGate, StubManifestClient};

use crate::common::{artifact_path, config_in, manifest_v2, orchestrator};

/// A store and filesystem state equivalent to "downloaded 2.0.0, not yet
/// installed", as a crashed-and-restarted process would find them.
async fn pending_install_fixture(dir: &TempDir) -> MemoryStore {
    tokio::fs::write(artifact_path(dir), b"downloaded artifact")
        .await
        .unwrap();
    MemoryStore::with_record(PersistedRecord {
        last_downloaded_version: Some("2.0.0".to_string()),
        install_pending: true,
        downloaded_at: None,
    })
}

#[tokio::test]
async fn scenario_d_denied_capability_keeps_install_pending() {
    let dir = TempDir::new().unwrap();
    let gate = StubInstallGate::denying();
    let orch = orchestrator(
        config_in(&dir),
        StubManifestClient::serving(manifest_v2()),
        pending_install_fixture(&dir).await,
        ScriptedDownloader::succeeding(&[]),
        gate.clone(),
    );

    orch.check_for_update().await.unwrap();
    assert_eq!(orch.phase(), UpdatePhase::PendingInstall);

    orch.trigger_install().await.unwrap();

    // denial is terminal for the attempt: no launch, no phase change
    assert_eq!(orch.phase(), UpdatePhase::PendingInstall);
    assert_eq!(gate.capability_check_count(), 1);
    assert_eq!(gate.launch_count(), 0);
    assert!(matches!(
        orch.take_notice(),
        Some(Notice::PermissionDenied { .. })
    ));
}

#[tokio::test]
async fn launch_failure_reverts_to_pending_install() {
    let dir = TempDir::new().unwrap();
    let store = pending_install_fixture(&dir).await;
    let orch = orchestrator(
        config_in(&dir),
        StubManifestClient::serving(manifest_v2()),
        store.clone(),
        ScriptedDownloader::succeeding(&[]),
        StubInstallGate::failing_launch(),
    );

    orch.check_for_update().await.unwrap();
    orch.trigger_install().await.unwrap();

    assert_eq!(orch.phase(), UpdatePhase::PendingInstall);
    assert!(matches!(
        orch.take_notice(),
        Some(Notice::InstallFailed { .. })
    ));
    // the flag stays set so the user can retry
    assert!(store.record().install_pending);
}

#[tokio::test]
async fn successful_handoff_enters_installing_and_ends_the_flow() {
    let dir = TempDir::new().unwrap();
    let store = pending_install_fixture(&dir).await;
    let gate = StubInstallGate::granting();
    let client = StubManifestClient::serving(manifest_v2());
    let orch = orchestrator(
        config_in(&dir),
        client.clone(),
        store.clone(),
        ScriptedDownloader::succeeding(&[]),
        gate.clone(),
    );

    orch.check_for_update().await.unwrap();
    orch.trigger_install().await.unwrap();

    assert_eq!(orch.phase(), UpdatePhase::Installing);
    assert_eq!(gate.launch_count(), 1);
    // pending intentionally stays set until a later check moves on
    assert!(store.record().install_pending);

    // the flow is quiescent: further operations are ignored
    orch.trigger_install().await.unwrap();
    assert_eq!(gate.launch_count(), 1);
    let fetches = client.fetch_count();
    orch.check_for_update().await.unwrap();
    assert_eq!(client.fetch_count(), fetches);
    assert_eq!(orch.phase(), UpdatePhase::Installing);
}

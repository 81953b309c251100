//! Manifest check flows: phase transitions, coalescing, failure notices.

use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Semaphore;

use updatekit::manifest::RemoteManifest;
use updatekit::orchestrator::{Notice, UpdatePhase};
use updatekit::test_utils::{MemoryStore, ScriptedDownloader, StubInstallGate, StubManifestClient};

use crate::common::{INSTALLED, config_in, manifest_v2, orchestrator, wait_for_state};

#[tokio::test]
async fn same_remote_version_leaves_phase_idle() {
    let dir = TempDir::new().unwrap();
    let current = RemoteManifest {
        version: INSTALLED.to_string(),
        artifact_url: "https://x/app.bin".to_string(),
    };
    let orch = orchestrator(
        config_in(&dir),
        StubManifestClient::serving(current),
        MemoryStore::new(),
        ScriptedDownloader::succeeding(&[]),
        StubInstallGate::granting(),
    );

    orch.check_for_update().await.unwrap();

    let state = orch.snapshot();
    assert_eq!(state.phase, UpdatePhase::Idle);
    assert!(state.manifest.is_none());
    assert!(state.last_notice.is_none());
}

#[tokio::test]
async fn new_remote_version_becomes_available_with_manifest_retained() {
    let dir = TempDir::new().unwrap();
    let downloader = ScriptedDownloader::succeeding(&[]);
    let orch = orchestrator(
        config_in(&dir),
        StubManifestClient::serving(manifest_v2()),
        MemoryStore::new(),
        downloader.clone(),
        StubInstallGate::granting(),
    );

    orch.check_for_update().await.unwrap();

    let state = orch.snapshot();
    assert_eq!(state.phase, UpdatePhase::Available);
    // retained verbatim for the next action
    assert_eq!(state.manifest, Some(manifest_v2()));
    // availability alone downloads nothing
    assert_eq!(downloader.download_count(), 0);
}

#[tokio::test]
async fn failed_check_reverts_to_idle_with_a_notice() {
    let dir = TempDir::new().unwrap();
    let orch = orchestrator(
        config_in(&dir),
        StubManifestClient::unreachable(),
        MemoryStore::new(),
        ScriptedDownloader::succeeding(&[]),
        StubInstallGate::granting(),
    );

    orch.check_for_update().await.unwrap();

    // failure is non-sticky: the next check starts clean from Idle
    assert_eq!(orch.phase(), UpdatePhase::Idle);
    assert!(matches!(
        orch.take_notice(),
        Some(Notice::CheckFailed { .. })
    ));
}

#[tokio::test]
async fn scenario_a_phase_sequence_idle_checking_available() {
    let dir = TempDir::new().unwrap();
    let release = Arc::new(Semaphore::new(0));
    let orch = Arc::new(orchestrator(
        config_in(&dir),
        StubManifestClient::serving_paused(manifest_v2(), release.clone()),
        MemoryStore::new(),
        ScriptedDownloader::succeeding(&[]),
        StubInstallGate::granting(),
    ));
    let mut rx = orch.subscribe();
    assert_eq!(rx.borrow().phase, UpdatePhase::Idle);

    let task = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.check_for_update().await })
    };

    wait_for_state(&mut rx, |s| s.phase == UpdatePhase::Checking).await;
    release.add_permits(1);
    let state = wait_for_state(&mut rx, |s| s.phase == UpdatePhase::Available).await;
    assert_eq!(state.manifest, Some(manifest_v2()));

    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn concurrent_checks_are_coalesced() {
    let dir = TempDir::new().unwrap();
    let release = Arc::new(Semaphore::new(0));
    let client = StubManifestClient::serving_paused(manifest_v2(), release.clone());
    let orch = Arc::new(orchestrator(
        config_in(&dir),
        client.clone(),
        MemoryStore::new(),
        ScriptedDownloader::succeeding(&[]),
        StubInstallGate::granting(),
    ));
    let mut rx = orch.subscribe();

    let task = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.check_for_update().await })
    };
    wait_for_state(&mut rx, |s| s.phase == UpdatePhase::Checking).await;

    // a second check while Checking is ignored, not queued
    orch.check_for_update().await.unwrap();
    assert_eq!(client.fetch_count(), 1);
    assert_eq!(orch.phase(), UpdatePhase::Checking);

    release.add_permits(1);
    task.await.unwrap().unwrap();
    assert_eq!(client.fetch_count(), 1);
}

#[tokio::test]
async fn start_checks_only_when_auto_check_is_configured() {
    let dir = TempDir::new().unwrap();

    let quiet = StubManifestClient::serving(manifest_v2());
    let orch = orchestrator(
        config_in(&dir),
        quiet.clone(),
        MemoryStore::new(),
        ScriptedDownloader::succeeding(&[]),
        StubInstallGate::granting(),
    );
    orch.start().await.unwrap();
    assert_eq!(quiet.fetch_count(), 0);
    assert_eq!(orch.phase(), UpdatePhase::Idle);

    let eager = StubManifestClient::serving(manifest_v2());
    let orch = orchestrator(
        config_in(&dir).with_auto_check(true),
        eager.clone(),
        MemoryStore::new(),
        ScriptedDownloader::succeeding(&[]),
        StubInstallGate::granting(),
    );
    orch.start().await.unwrap();
    assert_eq!(eager.fetch_count(), 1);
    assert_eq!(orch.phase(), UpdatePhase::Available);
}

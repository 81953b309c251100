//! Download flows: progress reporting, coalescing, and retry behavior.

use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Semaphore;

use updatekit::orchestrator::{Notice, UpdatePhase};
use updatekit::test_utils::{MemoryStore, ScriptedDownloader, StubInstallGate, StubManifestClient};

use crate::common::{artifact_path, config_in, manifest_v2, orchestrator, wait_for_state};

#[tokio::test]
async fn scenario_b_download_success_records_and_pends_install() {
    let dir = TempDir::new().unwrap();
    let release = Arc::new(Semaphore::new(0));
    let store = MemoryStore::new();
    let downloader =
        ScriptedDownloader::succeeding(&[(50, 100), (100, 100)]).paused_before(1, release.clone());
    let orch = Arc::new(orchestrator(
        config_in(&dir),
        StubManifestClient::serving(manifest_v2()),
        store.clone(),
        downloader,
        StubInstallGate::granting(),
    ));
    let mut rx = orch.subscribe();

    orch.check_for_update().await.unwrap();
    assert_eq!(orch.phase(), UpdatePhase::Available);

    let task = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.trigger_update().await })
    };

    // first chunk observed at 50%
    let mid = wait_for_state(&mut rx, |s| s.progress.percent() == 50.0).await;
    assert_eq!(mid.phase, UpdatePhase::Downloading);

    release.add_permits(1);
    task.await.unwrap().unwrap();

    let state = orch.snapshot();
    assert_eq!(state.phase, UpdatePhase::PendingInstall);
    assert_eq!(state.progress.percent(), 100.0);

    let record = store.record();
    assert_eq!(record.last_downloaded_version.as_deref(), Some("2.0.0"));
    assert!(record.install_pending);
    assert!(record.downloaded_at.is_some());
    assert!(artifact_path(&dir).exists());
}

#[tokio::test]
async fn trigger_update_while_downloading_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let release = Arc::new(Semaphore::new(0));
    let downloader =
        ScriptedDownloader::succeeding(&[(50, 100), (100, 100)]).paused_before(1, release.clone());
    let orch = Arc::new(orchestrator(
        config_in(&dir),
        StubManifestClient::serving(manifest_v2()),
        MemoryStore::new(),
        downloader.clone(),
        StubInstallGate::granting(),
    ));
    let mut rx = orch.subscribe();

    orch.check_for_update().await.unwrap();
    let task = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.trigger_update().await })
    };
    wait_for_state(&mut rx, |s| s.progress.percent() == 50.0).await;

    // re-trigger mid-download: ignored, not queued
    orch.trigger_update().await.unwrap();
    let state = orch.snapshot();
    assert_eq!(state.phase, UpdatePhase::Downloading);
    assert_eq!(state.progress.percent(), 50.0);
    assert_eq!(downloader.download_count(), 1);

    release.add_permits(1);
    task.await.unwrap().unwrap();
    assert_eq!(orch.phase(), UpdatePhase::PendingInstall);
    assert_eq!(downloader.download_count(), 1);
}

#[tokio::test]
async fn download_failure_reverts_to_available_for_retry() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new();
    let orch = orchestrator(
        config_in(&dir),
        StubManifestClient::serving(manifest_v2()),
        store.clone(),
        ScriptedDownloader::failing(&[(50, 100)]),
        StubInstallGate::granting(),
    );

    orch.check_for_update().await.unwrap();
    orch.trigger_update().await.unwrap();

    let state = orch.snapshot();
    // retryable without a fresh check: manifest still offered
    assert_eq!(state.phase, UpdatePhase::Available);
    assert_eq!(state.manifest, Some(manifest_v2()));
    assert!(matches!(
        orch.take_notice(),
        Some(Notice::DownloadFailed { .. })
    ));

    // nothing recorded for an incomplete download
    let record = store.record();
    assert_eq!(record.last_downloaded_version, None);
    assert!(!record.install_pending);
}

#[tokio::test]
async fn progress_resets_at_the_start_of_a_new_attempt() {
    let dir = TempDir::new().unwrap();
    let release = Arc::new(Semaphore::new(1));
    let downloader =
        ScriptedDownloader::failing(&[(60, 100)]).paused_before(0, release.clone());
    let orch = Arc::new(orchestrator(
        config_in(&dir),
        StubManifestClient::serving(manifest_v2()),
        MemoryStore::new(),
        downloader,
        StubInstallGate::granting(),
    ));

    orch.check_for_update().await.unwrap();

    // first attempt runs straight through its permit and fails at 60%
    orch.trigger_update().await.unwrap();
    assert_eq!(orch.snapshot().progress.percent(), 60.0);
    assert_eq!(orch.phase(), UpdatePhase::Available);

    // second attempt: progress snaps back to 0 before any chunk arrives
    let mut rx = orch.subscribe();
    let task = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.trigger_update().await })
    };
    let state = wait_for_state(&mut rx, |s| s.phase == UpdatePhase::Downloading).await;
    assert_eq!(state.progress.percent(), 0.0);

    release.add_permits(1);
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn auto_download_proceeds_without_a_user_trigger() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new();
    let downloader = ScriptedDownloader::succeeding(&[(100, 100)]);
    let orch = orchestrator(
        config_in(&dir).with_auto_download(true),
        StubManifestClient::serving(manifest_v2()),
        store.clone(),
        downloader.clone(),
        StubInstallGate::granting(),
    );

    orch.check_for_update().await.unwrap();

    assert_eq!(orch.phase(), UpdatePhase::PendingInstall);
    assert_eq!(downloader.download_count(), 1);
    assert!(store.record().install_pending);
}

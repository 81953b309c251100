//! Global constants used throughout the updatekit codebase.
//!
//! This module contains well-known file names, persisted key names, and
//! timeout durations used across multiple modules. Defining them centrally
//! keeps the on-disk and on-wire contract discoverable in one place.

use std::time::Duration;

/// Fixed file name of the downloaded artifact.
///
/// The downloader always writes to this single name inside the configured
/// directory; a new download overwrites the previous artifact rather than
/// creating a versioned file. The cold-start resume check looks for exactly
/// this name.
pub const ARTIFACT_FILE_NAME: &str = "update-latest.bin";

/// Default file name of the persisted update record.
pub const RECORD_FILE_NAME: &str = "update-record.json";

/// Persisted key holding the version string of the last completed download.
///
/// Written only after a download fully completes, never during one.
pub const KEY_LAST_DOWNLOADED_VERSION: &str = "lastDownloadedVersion";

/// Persisted key holding the install-pending flag.
///
/// `true` means an artifact was downloaded and not yet handed to the
/// installer. The flag and the artifact file are written independently, so
/// consumers must re-verify the file actually exists before trusting it.
pub const KEY_INSTALL_PENDING: &str = "installPending";

/// Timeout applied to the manifest fetch request (30 seconds).
///
/// The manifest is a small JSON document; anything slower than this is
/// treated as a transport failure. The artifact download deliberately has no
/// request timeout since large payloads on slow links are legitimate.
pub const MANIFEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connect timeout for the artifact download (30 seconds).
///
/// Bounds only the connection establishment, not the transfer itself.
pub const DOWNLOAD_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent sent with all HTTP requests.
pub const USER_AGENT: &str = concat!("updatekit/", env!("CARGO_PKG_VERSION"));

/// Remediation text surfaced when the install capability is denied.
///
/// Denial is terminal for the attempt; the only recovery path is the user
/// granting the capability in system settings and retrying.
pub const SETTINGS_REMEDIATION: &str =
    "Allow installs from unknown sources in system settings, then retry the install";

//! Artifact download with progress reporting.
//!
//! [`HttpArtifactDownloader`] streams the update payload to a single fixed
//! destination path, overwriting whatever was there before. Progress is
//! reported through a callback after every received chunk as a cumulative
//! [`DownloadProgress`] snapshot, so observed values are monotonically
//! non-decreasing within one attempt.
//!
//! Failure semantics are deliberately loose: on any transport or I/O error
//! the partially written file is left in place. Nothing downstream trusts a
//! file's presence alone - completion is recorded separately in the persisted
//! store - and the next attempt simply overwrites the partial file.
//!
//! Concurrent downloads to the same path are undefined; the orchestrator
//! serializes attempts through its phase guard.

use futures::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::constants::{DOWNLOAD_CONNECT_TIMEOUT, USER_AGENT};
use crate::core::UpdateError;
use crate::utils::fs::ensure_dir;

/// Snapshot of download progress.
///
/// `total_bytes` is taken from the Content-Length header and is `0` when the
/// server did not send one; [`percent`](Self::percent) treats that degenerate
/// case as 0% rather than dividing by zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Bytes written to the destination file so far
    pub bytes_written: u64,
    /// Expected total size, or 0 while unknown
    pub total_bytes: u64,
}

impl DownloadProgress {
    /// Completion percentage clamped to `[0, 100]`.
    ///
    /// Returns `0.0` while the total is unknown. A server that understates
    /// Content-Length cannot push the value past 100.
    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        ((self.bytes_written as f64 / self.total_bytes as f64) * 100.0).clamp(0.0, 100.0)
    }
}

/// Progress callback invoked at an implementation-defined cadence.
///
/// At least once per received chunk; consumers must treat calls as
/// latest-wins snapshots, not a uniform stream.
pub type ProgressFn = dyn Fn(DownloadProgress) + Send + Sync;

/// Streams update artifacts to local storage.
pub trait ArtifactDownloader: Send + Sync {
    /// Download `url` to `dest`, overwriting any prior content.
    ///
    /// The destination directory is created if absent. On failure the
    /// partially written file is left in place and the error is an
    /// [`UpdateError::Download`].
    fn download(
        &self,
        url: &str,
        dest: &Path,
        on_progress: &ProgressFn,
    ) -> impl Future<Output = Result<(), UpdateError>> + Send;
}

/// HTTP downloader over a shared [`reqwest::Client`].
///
/// Only the connection establishment is bounded by a timeout; the transfer
/// itself is allowed to take as long as the link needs.
#[derive(Debug, Clone)]
pub struct HttpArtifactDownloader {
    client: reqwest::Client,
}

impl HttpArtifactDownloader {
    /// Create a downloader with the default user agent and connect timeout.
    pub fn new() -> Result<Self, UpdateError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(DOWNLOAD_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| UpdateError::Download {
                url: String::new(),
                reason: format!("client construction failed: {e}"),
            })?;
        Ok(Self { client })
    }

    /// Create a downloader over an existing `reqwest::Client`.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl ArtifactDownloader for HttpArtifactDownloader {
    async fn download(
        &self,
        url: &str,
        dest: &Path,
        on_progress: &ProgressFn,
    ) -> Result<(), UpdateError> {
        debug!(url, dest = %dest.display(), "starting artifact download");

        if let Some(parent) = dest.parent() {
            ensure_dir(parent).await.map_err(|e| UpdateError::Download {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| {
                warn!(url, error = %e, "artifact request failed");
                UpdateError::Download {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            })?;

        let total_bytes = response.content_length().unwrap_or(0);
        if total_bytes == 0 {
            debug!(url, "no content length; progress total stays unknown");
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| UpdateError::Download {
                url: url.to_string(),
                reason: format!("create {}: {e}", dest.display()),
            })?;

        let mut stream = response.bytes_stream();
        let mut bytes_written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| UpdateError::Download {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
            file.write_all(&chunk)
                .await
                .map_err(|e| UpdateError::Download {
                    url: url.to_string(),
                    reason: format!("write {}: {e}", dest.display()),
                })?;
            bytes_written += chunk.len() as u64;
            on_progress(DownloadProgress {
                bytes_written,
                total_bytes,
            });
        }

        file.flush().await.map_err(|e| UpdateError::Download {
            url: url.to_string(),
            reason: format!("flush {}: {e}", dest.display()),
        })?;

        // Final snapshot so even an empty body reports completion once.
        on_progress(DownloadProgress {
            bytes_written,
            total_bytes,
        });

        info!(url, bytes = bytes_written, "artifact download complete");
        Ok(())
    }
}

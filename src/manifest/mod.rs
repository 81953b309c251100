//! Remote version manifest fetching and parsing.
//!
//! The manifest is a small JSON document published by the update server
//! describing the latest available build:
//!
//! ```json
//! { "data": { "version": "2.0.0", "artifactUrl": "https://x/app.bin" } }
//! ```
//!
//! [`HttpManifestClient`] performs a single GET per check with no internal
//! retries; retry policy belongs to whoever drives the check. Transport
//! failures and malformed bodies are reported as distinct error variants so
//! logs can tell an unreachable server from a misbehaving one, even though
//! the state machine treats both as a failed check.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::{MANIFEST_TIMEOUT, USER_AGENT};
use crate::core::UpdateError;

/// The remote version manifest.
///
/// Produced by a [`ManifestSource`] per check cycle and discarded once a
/// newer check supersedes it. `version` is an opaque string compared for
/// equality against the installed version; no ordering is imposed, so a
/// server can roll builds forward or backward and clients follow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteManifest {
    /// Version string of the latest available build
    pub version: String,
    /// URL of the downloadable artifact for that build
    #[serde(rename = "artifactUrl")]
    pub artifact_url: String,
}

/// Wire envelope wrapping the manifest payload.
///
/// The update endpoint nests the manifest under a `data` key; any response
/// not matching this shape is a parse failure.
#[derive(Debug, Deserialize)]
struct ManifestEnvelope {
    data: RemoteManifest,
}

/// Parse a manifest response body.
///
/// Accepts exactly the `{ "data": { ... } }` envelope; a missing `version`
/// or `artifactUrl` field, or any other shape, is an
/// [`UpdateError::ManifestParse`].
pub fn parse_manifest(body: &str) -> Result<RemoteManifest, UpdateError> {
    let envelope: ManifestEnvelope =
        serde_json::from_str(body).map_err(|e| UpdateError::ManifestParse {
            reason: e.to_string(),
        })?;
    Ok(envelope.data)
}

/// Source of remote version manifests.
///
/// The orchestrator is generic over this trait; production code uses
/// [`HttpManifestClient`], tests substitute a scripted double.
pub trait ManifestSource: Send + Sync {
    /// Fetch and parse the manifest at `url`.
    ///
    /// One request, one response, no retries. Errors are either
    /// [`UpdateError::Network`] (transport, timeout, non-success status) or
    /// [`UpdateError::ManifestParse`] (body did not match the envelope).
    fn fetch_manifest(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<RemoteManifest, UpdateError>> + Send;
}

/// HTTP manifest client over a shared [`reqwest::Client`].
///
/// The client is built once with the crate user agent and the manifest
/// timeout from [`constants`](crate::constants); cloning `reqwest::Client`
/// internally shares the connection pool, so constructing one
/// `HttpManifestClient` per orchestrator is cheap.
#[derive(Debug, Clone)]
pub struct HttpManifestClient {
    client: reqwest::Client,
}

impl HttpManifestClient {
    /// Create a client with the default user agent and timeout.
    pub fn new() -> Result<Self, UpdateError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(MANIFEST_TIMEOUT)
            .build()
            .map_err(|e| UpdateError::Network {
                operation: "manifest client construction".to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }

    /// Create a client over an existing `reqwest::Client`.
    ///
    /// Lets hosts share one connection pool across components; the caller is
    /// responsible for any timeout configuration.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl ManifestSource for HttpManifestClient {
    async fn fetch_manifest(&self, url: &str) -> Result<RemoteManifest, UpdateError> {
        debug!(url, "fetching update manifest");

        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(url, error = %e, "manifest request failed");
            UpdateError::Network {
                operation: "manifest fetch".to_string(),
                reason: e.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, %status, "manifest endpoint returned non-success status");
            return Err(UpdateError::Network {
                operation: "manifest fetch".to_string(),
                reason: format!("unexpected status {status}"),
            });
        }

        let body = response.text().await.map_err(|e| UpdateError::Network {
            operation: "manifest fetch".to_string(),
            reason: e.to_string(),
        })?;

        let manifest = parse_manifest(&body).inspect_err(|e| {
            warn!(url, error = %e, "manifest body did not parse");
        })?;

        debug!(version = %manifest.version, "manifest fetched");
        Ok(manifest)
    }
}

//! Filesystem helpers shared by the store and the downloader.

use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// Ensure a directory exists, creating it and any parents if absent.
///
/// Idempotent: an existing directory is fine, an existing non-directory at
/// the path is an error.
///
/// # Examples
///
/// ```rust,no_run
/// use std::path::Path;
/// use updatekit::utils::fs::ensure_dir;
///
/// # async fn example() -> anyhow::Result<()> {
/// ensure_dir(Path::new("downloads/updates")).await?;
/// # Ok(())
/// # }
/// ```
pub async fn ensure_dir(path: &Path) -> Result<()> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(anyhow::anyhow!(
            "Path exists but is not a directory: {}",
            path.display()
        )),
        Err(_) => fs::create_dir_all(path)
            .await
            .with_context(|| format!("Failed to create directory: {}", path.display())),
    }
}

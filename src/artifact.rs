// ABOUTME: Persists downloaded packages and job logs under the run folders
// ABOUTME: Creates missing folders and records size and digest of what was written

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Writes `bytes` to `folder/file_name`, creating `folder` when missing.
pub async fn save_artifact(folder: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    if !tokio::fs::try_exists(folder).await.unwrap_or(false) {
        tokio::fs::create_dir_all(folder)
            .await
            .with_context(|| format!("Failed to create directory {}", folder.display()))?;
        info!(folder = %folder.display(), "Directory created");
    }

    let path = folder.join(file_name);
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    debug!(
        path = %path.display(),
        bytes = bytes.len(),
        sha256 = %sha256_hex(bytes),
        "Artifact written"
    );
    Ok(path)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

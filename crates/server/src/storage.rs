//! Blob storage seam for uploaded files.

use async_trait::async_trait;
use llm_relay_common::{RelayError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Persistence for uploaded client files, keyed by opaque storage key.
///
/// Keys are server-generated; a key observed in conversation history is only
/// ever read back through this trait, never handed to the model or client.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Vec<u8>>;
}

/// Filesystem-backed store rooted at a single directory.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        // Keys are flat names; anything path-like is rejected.
        if key.is_empty() || key.contains("..") || key.contains('/') || key.contains('\\') {
            return Err(RelayError::Storage(format!("invalid storage key: {key}")));
        }
        Ok(self.root.join(key))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.resolve(key)?;
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(&path, bytes).await?;
        debug!(key, size = bytes.len(), "stored blob");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.resolve(key)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| RelayError::Storage(format!("read {key}: {e}")))
    }
}

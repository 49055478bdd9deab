//! Raw-byte storage keyed by file id.

use super::StoreError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Persistence for uploaded bytes, addressed by `file_id`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write the full content for `file_id`, replacing anything already there.
    async fn put(&self, file_id: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// Remove the content for `file_id`. Removing an absent blob is not an error.
    async fn remove(&self, file_id: &str) -> Result<(), StoreError>;
}

/// Blobs stored as plain files named after their id inside one directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    base_dir: PathBuf,
}

impl FsBlobStore {
    /// Use `base_dir` as the storage folder, creating it when missing.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Directory holding the blobs.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// On-disk location of a blob. Ids never carry path separators; they are generated UUIDs.
    pub fn path_for(&self, file_id: &str) -> PathBuf {
        self.base_dir.join(file_id)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, file_id: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(file_id);
        fs::write(&path, bytes).await?;
        tracing::debug!(file_id, bytes = bytes.len(), path = %path.display(), "Stored blob");
        Ok(())
    }

    async fn remove(&self, file_id: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(file_id)).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

//! Persistence for uploaded files: metadata records and raw bytes.

pub mod blob;
pub mod metadata;
pub mod sweep;

pub use blob::{BlobStore, FsBlobStore};
pub use metadata::{MetadataStore, SqliteMetadataStore};
pub use sweep::{SweepReport, sweep_orphaned_blobs};

use thiserror::Error;

/// Errors raised by the metadata and blob stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with the same file name already exists.
    #[error("A file named '{0}' is already stored")]
    DuplicateName(String),
    /// SQLite rejected an operation.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Filesystem access failed.
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Blocking worker running the operation did not complete.
    #[error("Storage task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::Task(error.to_string())
    }
}

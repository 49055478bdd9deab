//! Records, requests and errors exchanged with the file service.

use crate::extraction::ExtractionError;
use crate::store::StoreError;
use crate::summarization::SummarizationClientError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Persisted metadata for one processed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Identifier generated at ingestion.
    pub file_id: String,
    /// Client-supplied file name, unique across records.
    pub file_name: String,
    /// Summary returned by the summarization service.
    pub file_summary: String,
}

/// A document handed to the upload pipeline.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// File name declared by the client.
    pub file_name: String,
    /// Raw document bytes.
    pub content: Vec<u8>,
}

/// Errors returned by the upload pipeline and query operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Credentials did not match the configured pair.
    #[error("Invalid credentials")]
    Unauthorized,
    /// Upload name does not carry a supported extension.
    #[error("Invalid file type: {0}")]
    InvalidFileType(String),
    /// Extractor has no parser for the document.
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),
    /// A record with the same file name already exists.
    #[error("File already uploaded: {0}")]
    DuplicateFile(String),
    /// Remote summarization did not succeed.
    #[error("Error summarizing text: {0}")]
    SummarizationFailed(#[from] SummarizationClientError),
    /// No record matches the requested id.
    #[error("File not found: {0}")]
    NotFound(String),
    /// Document parsing failed.
    #[error("Failed to process file: {0}")]
    Processing(String),
    /// Metadata or blob storage failed.
    #[error("Storage failure: {0}")]
    Storage(StoreError),
}

impl From<ExtractionError> for ServiceError {
    fn from(error: ExtractionError) -> Self {
        match error {
            ExtractionError::UnsupportedFormat(name) => Self::UnsupportedFormat(name),
            other => Self::Processing(other.to_string()),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DuplicateName(name) => Self::DuplicateFile(name),
            other => Self::Storage(other),
        }
    }
}

impl ServiceError {
    /// Whether the error is a validation outcome (credentials, file type, known name) rather than
    /// a failure of storage, extraction or summarization.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized | Self::InvalidFileType(_) | Self::DuplicateFile(_)
        )
    }
}

//! File service coordinating validation, storage, extraction and summarization.

use crate::{
    auth::{CredentialVerifier, Credentials},
    config::Config,
    extraction::{DocumentFormat, extract_text},
    metrics::{MetricsSnapshot, UploadMetrics},
    service::types::{FileRecord, ServiceError, UploadRequest},
    store::{BlobStore, FsBlobStore, MetadataStore, SqliteMetadataStore},
    summarization::{RemoteSummarizationClient, RemoteSummarizationSettings, SummarizationClient},
};
use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Runs uploads end to end and answers metadata queries.
///
/// The service owns long-lived handles to the metadata store, blob store, summarization client
/// and metrics registry. Construct it once near process start and share it through an `Arc`;
/// every handle is injected, so tests can swap any of them for a double.
pub struct FileService {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    summarizer: Arc<dyn SummarizationClient>,
    verifier: CredentialVerifier,
    metrics: Arc<UploadMetrics>,
}

/// Abstraction over the file service used by the HTTP surface.
#[async_trait]
pub trait FileApi: Send + Sync {
    /// Check upload credentials before the request body is read. A refusal counts as a
    /// rejected upload.
    fn authorize_upload(&self, credentials: &Credentials) -> Result<(), ServiceError>;

    /// Validate, store, extract, summarize and record an uploaded document.
    async fn upload(
        &self,
        credentials: &Credentials,
        request: UploadRequest,
    ) -> Result<FileRecord, ServiceError>;

    /// Every known file id, in store iteration order.
    async fn list_file_ids(&self, credentials: &Credentials) -> Result<Vec<String>, ServiceError>;

    /// The record stored for `file_id`.
    async fn get_file_record(
        &self,
        credentials: &Credentials,
        file_id: &str,
    ) -> Result<FileRecord, ServiceError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl FileService {
    /// Assemble a service from explicit collaborators.
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        summarizer: Arc<dyn SummarizationClient>,
        verifier: CredentialVerifier,
    ) -> Self {
        Self {
            metadata,
            blobs,
            summarizer,
            verifier,
            metrics: Arc::new(UploadMetrics::new()),
        }
    }

    /// Build the production service: SQLite metadata, filesystem blobs, remote summarizer.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        tracing::info!(path = %config.database_path.display(), "Opening metadata store");
        let metadata = SqliteMetadataStore::open(&config.database_path)
            .context("failed to open metadata database")?;
        let blobs =
            FsBlobStore::new(&config.storage_dir).context("failed to prepare storage folder")?;
        let summarizer = RemoteSummarizationClient::new(RemoteSummarizationSettings {
            endpoint: config.summarizer_url.clone(),
            api_key: config.summarizer_api_key.clone(),
            timeout: config.summarizer_timeout,
        })
        .context("failed to build summarization client")?;
        let verifier = CredentialVerifier::new(Credentials::new(
            config.username.clone(),
            config.password.clone(),
        ));
        tracing::debug!(storage_dir = %config.storage_dir.display(), "File service ready");

        Ok(Self::new(
            Arc::new(metadata),
            Arc::new(blobs),
            Arc::new(summarizer),
            verifier,
        ))
    }

    fn authorize(&self, credentials: &Credentials) -> Result<(), ServiceError> {
        if self.verifier.verify(credentials) {
            Ok(())
        } else {
            tracing::warn!(username = %credentials.username, "Rejected credentials");
            Err(ServiceError::Unauthorized)
        }
    }

    /// Check upload credentials and count a refusal as a rejected upload.
    pub fn authorize_upload(&self, credentials: &Credentials) -> Result<(), ServiceError> {
        let result = self.authorize(credentials);
        if result.is_err() {
            self.metrics.record_rejection();
        }
        result
    }

    /// Run the upload pipeline and account for its outcome.
    ///
    /// Errors raised while admitting the upload are rejections; errors after the blob write are
    /// failures, including a name taken by a concurrent upload that won the insert.
    pub async fn upload(
        &self,
        credentials: &Credentials,
        request: UploadRequest,
    ) -> Result<FileRecord, ServiceError> {
        let file_name = request.file_name.clone();
        let format = match self.admit(credentials, &file_name).await {
            Ok(format) => format,
            Err(error) => {
                if error.is_rejection() {
                    self.metrics.record_rejection();
                    tracing::info!(file_name = %file_name, error = %error, "Upload rejected");
                } else {
                    self.metrics.record_failure();
                    tracing::error!(file_name = %file_name, error = %error, "Upload failed");
                }
                return Err(error);
            }
        };

        let result = self.ingest(format, request).await;
        if let Err(error) = &result {
            self.metrics.record_failure();
            tracing::error!(file_name = %file_name, error = %error, "Upload failed");
        }
        result
    }

    /// Checks that run before any storage write: credentials, file type and name uniqueness.
    async fn admit(
        &self,
        credentials: &Credentials,
        file_name: &str,
    ) -> Result<DocumentFormat, ServiceError> {
        self.authorize(credentials)?;

        let format = DocumentFormat::from_filename(file_name)
            .ok_or_else(|| ServiceError::InvalidFileType(file_name.to_string()))?;

        if self.metadata.find_by_name(file_name).await?.is_some() {
            return Err(ServiceError::DuplicateFile(file_name.to_string()));
        }
        Ok(format)
    }

    async fn ingest(
        &self,
        format: DocumentFormat,
        request: UploadRequest,
    ) -> Result<FileRecord, ServiceError> {
        let UploadRequest { file_name, content } = request;
        let file_id = Uuid::new_v4().to_string();
        let size = content.len() as u64;
        tracing::info!(
            file_id = %file_id,
            file_name = %file_name,
            %format,
            bytes = size,
            "Processing upload"
        );
        self.blobs.put(&file_id, &content).await?;

        match self.process(&file_id, &file_name, content).await {
            Ok(record) => {
                self.metrics.record_upload(size);
                tracing::info!(file_id = %file_id, file_name = %file_name, "Upload completed");
                Ok(record)
            }
            Err(error) => {
                if let Err(cleanup) = self.blobs.remove(&file_id).await {
                    tracing::warn!(
                        file_id = %file_id,
                        error = %cleanup,
                        "Failed to remove blob of failed upload"
                    );
                }
                Err(error)
            }
        }
    }

    /// Extraction, summarization and the metadata insert: the steps that run after the blob is
    /// written.
    async fn process(
        &self,
        file_id: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<FileRecord, ServiceError> {
        let name = file_name.to_string();
        let text = tokio::task::spawn_blocking(move || extract_text(&content, &name))
            .await
            .map_err(|error| {
                ServiceError::Processing(format!("extraction task failed: {error}"))
            })??;
        let chars = text.chars().count();
        tracing::debug!(file_id, chars, "Text extracted");

        let file_summary = self.summarizer.summarize(&text).await?;
        let summary_chars = file_summary.chars().count();
        tracing::debug!(file_id, summary_chars, "Summary received");

        let record = FileRecord {
            file_id: file_id.to_string(),
            file_name: file_name.to_string(),
            file_summary,
        };
        self.metadata.insert(&record).await?;
        Ok(record)
    }

    /// Every known file id.
    pub async fn list_file_ids(
        &self,
        credentials: &Credentials,
    ) -> Result<Vec<String>, ServiceError> {
        self.authorize(credentials)?;
        Ok(self.metadata.list_ids().await?)
    }

    /// The record stored for `file_id`.
    pub async fn get_file_record(
        &self,
        credentials: &Credentials,
        file_id: &str,
    ) -> Result<FileRecord, ServiceError> {
        self.authorize(credentials)?;
        self.metadata
            .get(file_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(file_id.to_string()))
    }

    /// Return the current upload metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl FileApi for FileService {
    fn authorize_upload(&self, credentials: &Credentials) -> Result<(), ServiceError> {
        FileService::authorize_upload(self, credentials)
    }

    async fn upload(
        &self,
        credentials: &Credentials,
        request: UploadRequest,
    ) -> Result<FileRecord, ServiceError> {
        FileService::upload(self, credentials, request).await
    }

    async fn list_file_ids(&self, credentials: &Credentials) -> Result<Vec<String>, ServiceError> {
        FileService::list_file_ids(self, credentials).await
    }

    async fn get_file_record(
        &self,
        credentials: &Credentials,
        file_id: &str,
    ) -> Result<FileRecord, ServiceError> {
        FileService::get_file_record(self, credentials, file_id).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        FileService::metrics_snapshot(self)
    }
}

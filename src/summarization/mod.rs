//! Client for the remote summarization capability.
//!
//! The remote endpoint receives the full document text as a form body together with a fixed
//! target line count and answers with a JSON object carrying a `summary` field. The call is a
//! single round-trip: no retries and no backoff.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Number of summary lines requested from the remote service.
pub const SUMMARY_LINES: u32 = 3;

/// Errors surfaced while requesting a summary.
#[derive(Debug, Error)]
pub enum SummarizationClientError {
    /// Remote service could not be reached.
    #[error("Summarization provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Remote service answered with a non-success status.
    #[error("Failed to generate summary: {0}")]
    GenerationFailed(String),
    /// Success response did not carry a usable summary.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Interface implemented by summarization backends.
#[async_trait]
pub trait SummarizationClient: Send + Sync {
    /// Condense `text` into a short summary.
    async fn summarize(&self, text: &str) -> Result<String, SummarizationClientError>;
}

/// Settings for [`RemoteSummarizationClient`].
#[derive(Debug, Clone)]
pub struct RemoteSummarizationSettings {
    /// Full URL of the summarize endpoint.
    pub endpoint: String,
    /// Bearer credential for the `Authorization` header.
    pub api_key: String,
    /// Optional request timeout; `None` waits for the remote indefinitely.
    pub timeout: Option<Duration>,
}

/// HTTPS client for the hosted summarization API.
pub struct RemoteSummarizationClient {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl RemoteSummarizationClient {
    /// Build a client from explicit settings.
    pub fn new(settings: RemoteSummarizationSettings) -> Result<Self, SummarizationClientError> {
        let mut builder =
            Client::builder().user_agent(concat!("filesum/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|error| {
            SummarizationClientError::ProviderUnavailable(format!(
                "failed to construct HTTP client: {error}"
            ))
        })?;
        tracing::debug!(
            endpoint = %settings.endpoint,
            timeout_secs = settings.timeout.map(|t| t.as_secs()),
            "Initialized summarization client"
        );
        Ok(Self {
            http,
            endpoint: settings.endpoint,
            api_key: settings.api_key,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    summary: Option<String>,
}

#[async_trait]
impl SummarizationClient for RemoteSummarizationClient {
    async fn summarize(&self, text: &str) -> Result<String, SummarizationClientError> {
        let lines = SUMMARY_LINES.to_string();
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .form(&[("text", text), ("lines", lines.as_str())])
            .send()
            .await
            .map_err(|error| {
                SummarizationClientError::ProviderUnavailable(format!(
                    "failed to reach {}: {error}",
                    self.endpoint
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizationClientError::GenerationFailed(format!(
                "summarizer returned {status}: {body}"
            )));
        }

        let body: SummaryResponse = response.json().await.map_err(|error| {
            SummarizationClientError::InvalidResponse(format!(
                "failed to decode summarizer response: {error}"
            ))
        })?;

        body.summary.ok_or_else(|| {
            SummarizationClientError::InvalidResponse("response has no `summary` field".into())
        })
    }
}

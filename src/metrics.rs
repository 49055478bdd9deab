use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing upload activity.
#[derive(Default)]
pub struct UploadMetrics {
    files_uploaded: AtomicU64,
    uploads_rejected: AtomicU64,
    uploads_failed: AtomicU64,
    bytes_stored: AtomicU64,
}

impl UploadMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed upload and the size of its stored content.
    pub fn record_upload(&self, bytes: u64) {
        self.files_uploaded.fetch_add(1, Ordering::Relaxed);
        self.bytes_stored.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record an upload turned away before any processing (credentials, type, duplicate).
    pub fn record_rejection(&self) {
        self.uploads_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an upload that failed during storage, extraction or summarization.
    pub fn record_failure(&self) {
        self.uploads_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            files_uploaded: self.files_uploaded.load(Ordering::Relaxed),
            uploads_rejected: self.uploads_rejected.load(Ordering::Relaxed),
            uploads_failed: self.uploads_failed.load(Ordering::Relaxed),
            bytes_stored: self.bytes_stored.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of upload counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Uploads that produced a stored record since startup.
    pub files_uploaded: u64,
    /// Uploads refused by validation.
    pub uploads_rejected: u64,
    /// Uploads that failed after validation passed.
    pub uploads_failed: u64,
    /// Total bytes of successfully uploaded documents.
    pub bytes_stored: u64,
}

//! Removal of blobs that never received a metadata record.
//!
//! The upload pipeline deletes its blob when a later step fails, but a crash between the blob
//! write and the metadata insert still leaves bytes behind. The sweep walks the storage folder
//! and deletes blobs that are older than a grace period and unknown to the metadata store. The
//! grace period keeps in-flight uploads safe.

use super::{FsBlobStore, MetadataStore, StoreError};
use std::time::{Duration, SystemTime};
use walkdir::WalkDir;

/// Outcome of a sweep run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Blobs inspected.
    pub scanned: usize,
    /// Blobs without a record that are older than the grace period.
    pub orphaned: Vec<String>,
    /// Orphans actually deleted (zero on a dry run).
    pub removed: usize,
}

/// Find (and unless `dry_run`, delete) orphaned blobs older than `min_age`.
pub async fn sweep_orphaned_blobs(
    blobs: &FsBlobStore,
    metadata: &dyn MetadataStore,
    min_age: Duration,
    dry_run: bool,
) -> Result<SweepReport, StoreError> {
    let now = SystemTime::now();
    let mut report = SweepReport::default();

    for entry in WalkDir::new(blobs.base_dir()).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|error| StoreError::Io(error.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(file_id) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        report.scanned += 1;

        let modified = entry
            .metadata()
            .map_err(|error| StoreError::Io(error.into()))?
            .modified()?;
        let age = now.duration_since(modified).unwrap_or_default();
        if age < min_age || metadata.contains(&file_id).await? {
            continue;
        }

        if !dry_run {
            std::fs::remove_file(entry.path())?;
            report.removed += 1;
        }
        tracing::info!(file_id = %file_id, age_secs = age.as_secs(), dry_run, "Orphaned blob");
        report.orphaned.push(file_id);
    }

    tracing::info!(
        scanned = report.scanned,
        orphaned = report.orphaned.len(),
        removed = report.removed,
        "Sweep finished"
    );
    Ok(report)
}

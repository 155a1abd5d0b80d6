//! Import operation results
//!
//! Per-batch results returned by the admin backend and the aggregates the two
//! import phases fold them into.

use crate::services::RemoteError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Row the backend skipped because a profile with that email already exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 1-based row number as reported by the backend (batch-relative)
    pub row: usize,
    pub email: String,
    /// 1-based position of the first row of the batch this entry came from
    #[serde(skip)]
    pub batch_first_row: Option<usize>,
}

impl SkippedRow {
    pub fn new(row: usize, email: impl Into<String>) -> Self {
        Self {
            row,
            email: email.into(),
            batch_first_row: None,
        }
    }
}

/// Row-level import error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// 1-based row number; batch-relative when `batch_first_row` is set
    pub row: usize,
    pub message: String,
    /// 1-based position of the first row of the batch this entry came from
    #[serde(skip)]
    pub batch_first_row: Option<usize>,
}

impl RowError {
    pub fn new(row: usize, message: impl Into<String>) -> Self {
        Self {
            row,
            message: message.into(),
            batch_first_row: None,
        }
    }
}

/// "Row N" label, with the batch it belongs to when the number is batch-relative
pub fn row_label(row: usize, batch_first_row: Option<usize>) -> String {
    match batch_first_row {
        Some(first) => format!("Row {} (batch starting at row {})", row, first),
        None => format!("Row {}", row),
    }
}

/// Profile whose email screenshot still has to be fetched and stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingImage {
    pub profile_id: String,
    #[serde(alias = "imageUrl")]
    pub url: String,
}

/// Result of one bulk-import call, and the Phase 1 aggregate
///
/// Aggregation is element-wise: counters add up, lists concatenate in
/// submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BulkImportResult {
    pub records_inserted: usize,
    pub skipped: usize,
    pub skipped_rows: Vec<SkippedRow>,
    pub errors: Vec<RowError>,
    pub profiles_with_images: Vec<PendingImage>,
}

impl BulkImportResult {
    /// Create new empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one batch outcome into the aggregate
    ///
    /// `batch_start` is the 0-based index of the batch's first row in the
    /// submitted row list. Backend row numbers are kept as reported and tagged
    /// with their batch. A failed call contributes exactly one synthetic error
    /// attributed to the batch's first row and nothing else.
    pub fn fold_batch(&mut self, batch_start: usize, outcome: Result<BulkImportResult, RemoteError>) {
        match outcome {
            Ok(mut batch) => {
                let first_row = Some(batch_start + 1);
                for skipped in &mut batch.skipped_rows {
                    skipped.batch_first_row = first_row;
                }
                for error in &mut batch.errors {
                    error.batch_first_row = first_row;
                }
                self.absorb(batch);
            }
            Err(cause) => self
                .errors
                .push(RowError::new(batch_start + 1, format!("Batch failed: {}", cause))),
        }
    }

    /// Add a successful batch result
    pub fn absorb(&mut self, batch: BulkImportResult) {
        self.records_inserted += batch.records_inserted;
        self.skipped += batch.skipped;
        self.skipped_rows.extend(batch.skipped_rows);
        self.errors.extend(batch.errors);
        self.profiles_with_images.extend(batch.profiles_with_images);
    }

    /// Rows accounted for: inserted + skipped + errored
    pub fn rows_accounted(&self) -> usize {
        self.records_inserted + self.skipped + self.errors.len()
    }
}

/// Image the backend could not fetch or store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedImage {
    pub profile_id: String,
    #[serde(alias = "reason")]
    pub error: String,
}

/// Result of one image-processing call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageBatchResult {
    /// Profile ids whose screenshot was stored
    pub successful: Vec<String>,
    pub failed: Vec<FailedImage>,
}

/// Image failure as reported in the summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFailure {
    pub profile_id: String,
    pub reason: String,
}

/// Outcome of one image batch after partitioning every submitted item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageBatchOutcome {
    pub successful: Vec<String>,
    pub failed: Vec<ImageFailure>,
}

impl ImageBatchOutcome {
    /// Partition the submitted `batch` against the remote outcome
    ///
    /// Every submitted item lands in exactly one list. Items the backend left
    /// out of its answer count as failed; a failed call fails the whole batch.
    pub fn partition(batch: &[PendingImage], outcome: Result<ImageBatchResult, RemoteError>) -> Self {
        let mut partitioned = Self::default();

        match outcome {
            Ok(result) => {
                let succeeded: HashSet<&str> = result.successful.iter().map(String::as_str).collect();
                let failed: HashMap<&str, &str> = result
                    .failed
                    .iter()
                    .map(|f| (f.profile_id.as_str(), f.error.as_str()))
                    .collect();

                for item in batch {
                    let id = item.profile_id.as_str();
                    if succeeded.contains(id) {
                        partitioned.successful.push(item.profile_id.clone());
                    } else {
                        let reason = failed
                            .get(id)
                            .map(|r| r.to_string())
                            .unwrap_or_else(|| "Not reported by image service".to_string());
                        partitioned.failed.push(ImageFailure {
                            profile_id: item.profile_id.clone(),
                            reason,
                        });
                    }
                }
            }
            Err(cause) => {
                let reason = cause.to_string();
                partitioned.failed = batch
                    .iter()
                    .map(|item| ImageFailure {
                        profile_id: item.profile_id.clone(),
                        reason: reason.clone(),
                    })
                    .collect();
            }
        }

        partitioned
    }
}

/// Phase 2 aggregate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSummary {
    /// Pending images at phase start
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub failures: Vec<ImageFailure>,
}

impl ImageSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// Add one partitioned batch
    pub fn absorb(&mut self, batch: ImageBatchOutcome) {
        self.successful += batch.successful.len();
        self.failed += batch.failed.len();
        self.failures.extend(batch.failed);
    }

    /// Items settled so far
    pub fn processed(&self) -> usize {
        self.successful + self.failed
    }
}

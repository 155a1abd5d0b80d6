//! Phase 1: profile import
//!
//! Valid rows are submitted in fixed-size batches, strictly one call at a
//! time. Each batch outcome is folded into a single aggregate; a failed call
//! becomes one error entry and the phase moves on to the next batch.

use crate::models::{BulkImportResult, ImportSession, JournalistRow};
use crate::services::admin_client::JournalistAdmin;
use chrono::Utc;
use cj_common::events::{CjEvent, EventBus, ImportPhase};
use std::sync::Arc;

/// Rows per `bulk_import_journalists` call
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Batch import coordinator
pub struct BatchImportCoordinator {
    admin: Arc<dyn JournalistAdmin>,
    event_bus: EventBus,
    batch_size: usize,
}

impl BatchImportCoordinator {
    pub fn new(admin: Arc<dyn JournalistAdmin>, event_bus: EventBus) -> Self {
        Self {
            admin,
            event_bus,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Override the batch size (values below 1 are treated as 1)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Submit `rows` and return the aggregate result
    ///
    /// Never fails: remote errors are recorded per batch.
    pub async fn run(&self, session: &mut ImportSession, rows: &[JournalistRow]) -> BulkImportResult {
        let total = rows.len();
        let mut aggregate = BulkImportResult::new();

        tracing::info!(
            session_id = %session.session_id,
            total,
            batch_size = self.batch_size,
            "Phase 1: importing profiles"
        );

        for (index, batch) in rows.chunks(self.batch_size).enumerate() {
            let batch_start = index * self.batch_size;
            let batch_len = batch.len();

            tracing::debug!(
                session_id = %session.session_id,
                batch_start,
                batch_len,
                "Submitting profile batch"
            );

            let outcome = self.admin.bulk_import_journalists(batch).await;

            if let Err(e) = &outcome {
                tracing::warn!(
                    session_id = %session.session_id,
                    batch_start,
                    batch_len,
                    error = %e,
                    "Profile batch failed"
                );
                self.event_bus.emit_lossy(CjEvent::ImportBatchFailed {
                    session_id: session.session_id,
                    phase: ImportPhase::Profiles,
                    first_row: batch_start + 1,
                    batch_len,
                    message: e.to_string(),
                    timestamp: Utc::now(),
                });
            }

            aggregate.fold_batch(batch_start, outcome);

            session.update_profile_progress((batch_start + batch_len).min(total));
            let progress = &session.profile_progress;
            self.event_bus.emit_lossy(CjEvent::ImportProgressUpdate {
                session_id: session.session_id,
                phase: ImportPhase::Profiles,
                current: progress.current,
                total: progress.total,
                percentage: progress.percentage as f32,
                successful: 0,
                failed: 0,
                timestamp: Utc::now(),
            });
        }

        tracing::info!(
            session_id = %session.session_id,
            inserted = aggregate.records_inserted,
            skipped = aggregate.skipped,
            errors = aggregate.errors.len(),
            pending_images = aggregate.profiles_with_images.len(),
            "Phase 1 complete"
        );

        aggregate
    }
}

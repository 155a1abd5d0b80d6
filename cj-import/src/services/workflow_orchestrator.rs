//! Import workflow orchestrator
//!
//! Runs one confirmed session end to end:
//! MAPPING → IMPORTING (Phase 1 profiles, Phase 2 images) → COMPLETE
//!
//! Phase 2 runs whenever Phase 1 produced at least one pending image,
//! regardless of Phase 1 errors.

use crate::error::SessionResult;
use crate::models::{ImageSummary, ImportSession};
use crate::report::ImportSummary;
use crate::services::admin_client::JournalistAdmin;
use crate::services::batch_importer::BatchImportCoordinator;
use crate::services::image_processor::ImageBatchProcessor;
use chrono::Utc;
use cj_common::events::{CjEvent, EventBus};
use std::sync::Arc;

/// Workflow orchestrator service
pub struct ImportWorkflow {
    event_bus: EventBus,
    coordinator: BatchImportCoordinator,
    processor: ImageBatchProcessor,
}

impl ImportWorkflow {
    /// Create workflow with default batch sizes
    pub fn new(admin: Arc<dyn JournalistAdmin>, event_bus: EventBus) -> Self {
        Self {
            coordinator: BatchImportCoordinator::new(Arc::clone(&admin), event_bus.clone()),
            processor: ImageBatchProcessor::new(admin, event_bus.clone()),
            event_bus,
        }
    }

    /// Override both batch sizes
    pub fn with_batch_sizes(mut self, batch_size: usize, image_batch_size: usize) -> Self {
        self.coordinator = self.coordinator.with_batch_size(batch_size);
        self.processor = self.processor.with_batch_size(image_batch_size);
        self
    }

    /// Confirm the session's mapping and run both phases
    ///
    /// Fails only before any remote call: wrong state or no valid rows. The
    /// session keeps its state in that case.
    pub async fn run(&self, session: &mut ImportSession) -> SessionResult<ImportSummary> {
        let rows = session.begin_import()?;
        let valid_rows = rows.len();

        tracing::info!(
            session_id = %session.session_id,
            source = session.source_name.as_deref().unwrap_or("<memory>"),
            total_rows = session.total_row_count(),
            valid_rows,
            "Starting import workflow"
        );

        self.event_bus.emit_lossy(CjEvent::ImportSessionStarted {
            session_id: session.session_id,
            total_rows: session.total_row_count(),
            valid_rows,
            timestamp: Utc::now(),
        });

        let profiles = self.coordinator.run(session, &rows).await;

        let images = if profiles.profiles_with_images.is_empty() {
            tracing::debug!(session_id = %session.session_id, "No pending images, skipping Phase 2");
            ImageSummary::default()
        } else {
            let pending = profiles.profiles_with_images.clone();
            self.processor.run(session, &pending).await
        };

        session.complete(profiles.clone(), images.clone())?;
        let duration_seconds = session.duration_seconds();

        tracing::info!(
            session_id = %session.session_id,
            duration_seconds,
            "Import workflow completed"
        );

        self.event_bus.emit_lossy(CjEvent::ImportSessionCompleted {
            session_id: session.session_id,
            records_inserted: profiles.records_inserted,
            skipped: profiles.skipped,
            errors: profiles.errors.len(),
            images_successful: images.successful,
            images_failed: images.failed,
            duration_seconds,
            timestamp: Utc::now(),
        });

        Ok(ImportSummary {
            session_id: session.session_id,
            valid_rows,
            profiles,
            images,
            duration_seconds,
        })
    }

    /// Discard the session's run and return it to UPLOAD
    pub fn reset(&self, session: &mut ImportSession) {
        let transition = session.reset();
        tracing::info!(
            session_id = %session.session_id,
            from = %transition.old_state,
            "Import session reset"
        );
        self.event_bus.emit_lossy(CjEvent::ImportSessionReset {
            session_id: session.session_id,
            timestamp: transition.transitioned_at,
        });
    }
}

//! Phase 2: email screenshot processing
//!
//! Pending images are drained from a FIFO work queue in small batches. Every
//! item submitted leaves the queue after its single attempt, whatever the
//! outcome, so the phase always terminates with
//! `successful + failed == pending.len()`.

use crate::models::{ImageBatchOutcome, ImageSummary, ImportSession, PendingImage};
use crate::services::admin_client::JournalistAdmin;
use chrono::Utc;
use cj_common::events::{CjEvent, EventBus, ImportPhase};
use std::collections::VecDeque;
use std::sync::Arc;

/// Images per `process_image_batch` call
pub const IMAGE_BATCH_SIZE: usize = 10;

/// FIFO queue of images still to process
#[derive(Debug, Default)]
pub struct ImageWorkQueue {
    items: VecDeque<PendingImage>,
}

impl ImageWorkQueue {
    pub fn new(pending: impl IntoIterator<Item = PendingImage>) -> Self {
        Self {
            items: pending.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Up to `n` items from the front, left in place
    pub fn peek_batch(&self, n: usize) -> Vec<PendingImage> {
        self.items.iter().take(n).cloned().collect()
    }

    /// Remove `n` items from the front once their attempt is over
    pub fn settle(&mut self, n: usize) {
        let n = n.min(self.items.len());
        self.items.drain(..n);
    }
}

/// Image batch processor
pub struct ImageBatchProcessor {
    admin: Arc<dyn JournalistAdmin>,
    event_bus: EventBus,
    batch_size: usize,
}

impl ImageBatchProcessor {
    pub fn new(admin: Arc<dyn JournalistAdmin>, event_bus: EventBus) -> Self {
        Self {
            admin,
            event_bus,
            batch_size: IMAGE_BATCH_SIZE,
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

    /// Process every pending image once
    pub async fn run(&self, session: &mut ImportSession, pending: &[PendingImage]) -> ImageSummary {
        let mut queue = ImageWorkQueue::new(pending.iter().cloned());
        let mut summary = ImageSummary::new(queue.len());
        session.begin_image_phase(summary.total);

        tracing::info!(
            session_id = %session.session_id,
            total = summary.total,
            batch_size = self.batch_size,
            "Phase 2: processing images"
        );

        while !queue.is_empty() {
            let batch = queue.peek_batch(self.batch_size);
            let first_item = summary.processed() + 1;

            tracing::debug!(
                session_id = %session.session_id,
                batch_start = first_item - 1,
                batch_len = batch.len(),
                "Submitting image batch"
            );

            let outcome = self.admin.process_image_batch(&batch).await;

            if let Err(e) = &outcome {
                tracing::warn!(
                    session_id = %session.session_id,
                    batch_start = first_item - 1,
                    batch_len = batch.len(),
                    error = %e,
                    "Image batch failed"
                );
                self.event_bus.emit_lossy(CjEvent::ImportBatchFailed {
                    session_id: session.session_id,
                    phase: ImportPhase::Images,
                    first_row: first_item,
                    batch_len: batch.len(),
                    message: e.to_string(),
                    timestamp: Utc::now(),
                });
            }

            summary.absorb(ImageBatchOutcome::partition(&batch, outcome));
            queue.settle(batch.len());

            session.update_image_progress(&summary);
            let progress = &session.image_progress;
            self.event_bus.emit_lossy(CjEvent::ImportProgressUpdate {
                session_id: session.session_id,
                phase: ImportPhase::Images,
                current: progress.current,
                total: progress.total,
                percentage: progress.percentage as f32,
                successful: summary.successful,
                failed: summary.failed,
                timestamp: Utc::now(),
            });
        }

        tracing::info!(
            session_id = %session.session_id,
            successful = summary.successful,
            failed = summary.failed,
            "Phase 2 complete"
        );

        summary
    }
}

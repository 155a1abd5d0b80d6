//! Integration tests for the two-phase import workflow
//!
//! Runs whole sessions against scripted and in-memory admin backends.

mod helpers;

use cj_common::events::{CjEvent, EventBus, ImportPhase};
use cj_import::ingest::is_google_drive_link;
use cj_import::models::{FieldMapping, ImportState, PendingImage, RowError};
use cj_import::services::{ImageBatchProcessor, ImportWorkflow, JournalistAdmin, MemoryAdmin};
use cj_import::SessionError;
use helpers::{journalist_csv, mapped_session, Call, ImageMode, ScriptedAdmin};
use std::sync::Arc;

fn drive_rows(rows: &[cj_import::models::JournalistRow]) -> usize {
    rows.iter()
        .filter(|r| r.email_screenshot.as_deref().map_or(false, is_google_drive_link))
        .count()
}

#[tokio::test]
async fn test_failed_batch_is_isolated_and_images_still_processed() {
    // Given: 250 rows, 10 without email, every even row with a Drive screenshot
    let csv = journalist_csv(250, |i| i % 25 == 24, |i| i % 2 == 0);
    let mut session = mapped_session(&csv);
    assert_eq!(session.valid_row_count(), 240);
    let valid = session.valid_rows();

    // And: a backend whose second bulk call fails
    let admin = Arc::new(ScriptedAdmin::new().failing_bulk_call(1));
    let workflow = ImportWorkflow::new(admin.clone(), EventBus::new(1000));

    // When
    let summary = workflow.run(&mut session).await.unwrap();

    // Then: three batches were submitted
    assert_eq!(admin.bulk_batch_sizes(), vec![100, 100, 40]);

    // And: exactly one error, attributed to the first row of batch 2
    assert_eq!(summary.profiles.errors.len(), 1);
    let RowError { row, message, .. } = &summary.profiles.errors[0];
    assert_eq!(*row, 101);
    assert!(message.starts_with("Batch failed: "), "{}", message);

    // And: the other batches were imported
    assert_eq!(summary.profiles.records_inserted + summary.profiles.skipped, 140);

    // And: Phase 2 ran with the images of batches 1 and 3 only
    let expected_images = drive_rows(&valid[..100]) + drive_rows(&valid[200..]);
    assert!(expected_images > 0);
    assert_eq!(summary.images.total, expected_images);
    assert_eq!(summary.images.successful, expected_images);
    assert_eq!(summary.images.failed, 0);

    assert_eq!(session.state, ImportState::Complete);
    assert!(session.import_result.is_some());
}

#[tokio::test]
async fn test_reimport_skips_every_row() {
    let csv = journalist_csv(30, |_| false, |_| false);
    let admin = Arc::new(MemoryAdmin::new());
    let workflow = ImportWorkflow::new(admin.clone(), EventBus::new(100));

    let mut first = mapped_session(&csv);
    let summary = workflow.run(&mut first).await.unwrap();
    assert_eq!(summary.profiles.records_inserted, 30);

    // Same file, unchanged directory
    let mut second = mapped_session(&csv);
    let summary = workflow.run(&mut second).await.unwrap();
    assert_eq!(summary.profiles.records_inserted, 0);
    assert_eq!(summary.profiles.skipped, 30);
    assert!(summary.profiles.errors.is_empty());
    assert_eq!(admin.profile_count().await, 30);
}

#[tokio::test]
async fn test_conservation_without_batch_failures() {
    // Duplicates inside the file exercise the skip path within one run
    let mut csv = journalist_csv(120, |i| i % 7 == 0, |_| false);
    csv.push_str("Copy,user1@paper.com,Gazette,\nCopy,user2@paper.com,Gazette,\n");

    let mut session = mapped_session(&csv);
    let valid = session.valid_row_count();

    let workflow = ImportWorkflow::new(Arc::new(MemoryAdmin::new()), EventBus::new(100))
        .with_batch_sizes(25, 10);
    let summary = workflow.run(&mut session).await.unwrap();

    let p = &summary.profiles;
    assert_eq!(p.records_inserted + p.skipped + p.errors.len(), valid);
    assert_eq!(p.skipped, 2);
    assert_eq!(summary.valid_rows, valid);
}

#[tokio::test]
async fn test_every_image_failing_still_completes() {
    let csv = journalist_csv(23, |_| false, |_| true);
    let mut session = mapped_session(&csv);

    let admin = Arc::new(ScriptedAdmin::new().with_image_mode(ImageMode::FailCalls));
    let workflow = ImportWorkflow::new(admin.clone(), EventBus::new(100));
    let summary = workflow.run(&mut session).await.unwrap();

    assert_eq!(summary.images.total, 23);
    assert_eq!(summary.images.failed, 23);
    assert_eq!(summary.images.successful, 0);
    assert!(summary
        .images
        .failures
        .iter()
        .all(|f| f.reason == "Network error: connection refused"));
    assert_eq!(admin.image_batch_sizes(), vec![10, 10, 3]);
    assert_eq!(session.state, ImportState::Complete);
}

#[tokio::test]
async fn test_unreported_images_drain_as_failed() {
    let admin = Arc::new(ScriptedAdmin::new().with_image_mode(ImageMode::Silent));
    let processor = ImageBatchProcessor::new(admin.clone(), EventBus::new(100));

    let pending: Vec<PendingImage> = (0..15)
        .map(|i| PendingImage {
            profile_id: format!("p{}", i),
            url: format!("{}f{}/view", helpers::DRIVE_PREFIX, i),
        })
        .collect();

    let mut session = cj_import::models::ImportSession::new();
    let summary = processor.run(&mut session, &pending).await;

    assert_eq!(summary.successful + summary.failed, pending.len());
    assert_eq!(summary.failed, 15);
    assert_eq!(summary.failures[0].reason, "Not reported by image service");
    assert_eq!(admin.image_batch_sizes(), vec![10, 5]);
    assert!(session.image_progress.is_finished());
}

#[tokio::test]
async fn test_mixed_image_outcomes_partition_every_item() {
    let broken = format!("{}f3/view", helpers::DRIVE_PREFIX);
    let inner = MemoryAdmin::new().with_unreachable_image(broken);
    let admin = Arc::new(ScriptedAdmin::over(inner));

    let csv = journalist_csv(12, |_| false, |_| true);
    let mut session = mapped_session(&csv);
    let summary = ImportWorkflow::new(admin, EventBus::new(100))
        .run(&mut session)
        .await
        .unwrap();

    assert_eq!(summary.images.total, 12);
    assert_eq!(summary.images.successful, 11);
    assert_eq!(summary.images.failed, 1);
    assert_eq!(summary.images.failures[0].reason, "Failed to download/upload image");
}

#[tokio::test]
async fn test_no_valid_rows_refuses_import() {
    let csv = journalist_csv(5, |_| false, |_| false);
    let mut session = mapped_session(&csv);
    session.set_mapping_by_header("Email", FieldMapping::Skip).unwrap();

    let admin = Arc::new(ScriptedAdmin::new());
    let workflow = ImportWorkflow::new(admin.clone(), EventBus::new(100));
    let err = workflow.run(&mut session).await.unwrap_err();

    assert!(matches!(err, SessionError::NoValidRows));
    assert_eq!(session.state, ImportState::Mapping);
    assert!(admin.calls().is_empty());
}

#[tokio::test]
async fn test_calls_are_sequential_and_phase_ordered() {
    let csv = journalist_csv(45, |_| false, |i| i < 25);
    let mut session = mapped_session(&csv);

    let admin = Arc::new(ScriptedAdmin::new());
    ImportWorkflow::new(admin.clone(), EventBus::new(100))
        .with_batch_sizes(10, 10)
        .run(&mut session)
        .await
        .unwrap();

    assert_eq!(admin.max_in_flight(), 1);

    // Every profile call precedes every image call
    let calls = admin.calls();
    let first_image = calls
        .iter()
        .position(|c| matches!(c, Call::ProcessImages { .. }))
        .unwrap();
    assert_eq!(first_image, 5);
    assert!(calls[first_image..]
        .iter()
        .all(|c| matches!(c, Call::ProcessImages { .. })));

    // Batches are submitted in file order
    let firsts: Vec<Option<String>> = calls
        .iter()
        .filter_map(|c| match c {
            Call::BulkImport { first_email, .. } => Some(first_email.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(firsts[0].as_deref(), Some("user0@paper.com"));
    assert_eq!(firsts[4].as_deref(), Some("user40@paper.com"));
}

#[tokio::test]
async fn test_progress_events_follow_every_batch() {
    let csv = journalist_csv(250, |_| false, |i| i < 12);
    let mut session = mapped_session(&csv);

    let bus = EventBus::new(1000);
    let mut rx = bus.subscribe();
    let admin: Arc<dyn JournalistAdmin> = Arc::new(MemoryAdmin::new());
    ImportWorkflow::new(admin, bus).run(&mut session).await.unwrap();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    assert!(matches!(events.first(), Some(CjEvent::ImportSessionStarted { valid_rows: 250, .. })));
    assert!(matches!(events.last(), Some(CjEvent::ImportSessionCompleted { records_inserted: 250, .. })));

    let profile_progress: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            CjEvent::ImportProgressUpdate { phase: ImportPhase::Profiles, current, .. } => Some(*current),
            _ => None,
        })
        .collect();
    assert_eq!(profile_progress, vec![100, 200, 250]);

    let image_progress: Vec<(usize, usize)> = events
        .iter()
        .filter_map(|e| match e {
            CjEvent::ImportProgressUpdate { phase: ImportPhase::Images, current, total, .. } => {
                Some((*current, *total))
            }
            _ => None,
        })
        .collect();
    assert_eq!(image_progress, vec![(10, 12), (12, 12)]);
}

#[tokio::test]
async fn test_reset_after_complete_allows_new_upload() {
    let csv = journalist_csv(3, |_| false, |_| false);
    let mut session = mapped_session(&csv);
    let session_id = session.session_id;

    let bus = EventBus::new(100);
    let mut rx = bus.subscribe();
    let workflow = ImportWorkflow::new(Arc::new(MemoryAdmin::new()), bus);
    workflow.run(&mut session).await.unwrap();

    workflow.reset(&mut session);
    assert_eq!(session.state, ImportState::Upload);
    assert!(session.import_result.is_none());
    assert_eq!(session.session_id, session_id);

    let mut saw_reset = false;
    while let Ok(event) = rx.try_recv() {
        saw_reset |= matches!(event, CjEvent::ImportSessionReset { .. });
    }
    assert!(saw_reset);

    // Running again without a new upload is refused
    assert!(matches!(
        workflow.run(&mut session).await,
        Err(SessionError::InvalidTransition {
            from: ImportState::Upload,
            to: ImportState::Importing
        })
    ));
}

//! Data models for cj-import
//!
//! - Import workflow state machine and progress
//! - Journalist fields and mapped rows
//! - Per-batch results and phase aggregates

pub mod import_result;
pub mod import_session;
pub mod journalist;

pub use import_result::{
    BulkImportResult, FailedImage, ImageBatchOutcome, ImageBatchResult, ImageFailure, ImageSummary,
    PendingImage, RowError, SkippedRow, row_label,
};
pub use import_session::{ImportSession, ImportState, PhaseProgress, StateTransition};
pub use journalist::{split_categories, FieldMapping, JournalistRow, TargetField};

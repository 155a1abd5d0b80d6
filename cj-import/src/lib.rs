//! cj-import library interface
//!
//! Exposes the import pipeline for the binary and for integration testing.

pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod report;
pub mod services;

pub use crate::error::{SessionError, SessionResult};
pub use crate::report::ImportSummary;

/// Build identification string, e.g. `0.1.0 (a1b2c3d4, release, 2026-10-17T09:12:00+00:00)`
pub fn build_id() -> String {
    format!(
        "{} ({}, {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_PROFILE"),
        env!("BUILD_TIMESTAMP")
    )
}

//! Import summary for the operator

use crate::ingest::{mapped_preview, DEFAULT_PREVIEW_ROWS};
use crate::models::{row_label, BulkImportResult, ImageSummary, ImportSession};
use serde::Serialize;
use std::fmt::Write;
use uuid::Uuid;

/// Detail entries listed per section before the overflow line
pub const DETAIL_LIMIT: usize = 20;

/// Outcome of one complete import run
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub session_id: Uuid,
    pub valid_rows: usize,
    pub profiles: BulkImportResult,
    pub images: ImageSummary,
    pub duration_seconds: u64,
}

impl ImportSummary {
    /// True when neither phase recorded a failure
    pub fn is_clean(&self) -> bool {
        self.profiles.errors.is_empty() && self.images.failed == 0
    }

    /// Plain-text report
    pub fn render(&self) -> String {
        let mut out = String::new();
        let p = &self.profiles;

        let _ = writeln!(out, "Import complete ({}s)", self.duration_seconds);
        let _ = writeln!(out, "  Inserted: {}", p.records_inserted);
        let _ = writeln!(out, "  Skipped (already exist): {}", p.skipped);
        let _ = writeln!(out, "  Errors: {}", p.errors.len());

        if self.images.total > 0 {
            let _ = writeln!(
                out,
                "  Images: {} succeeded, {} failed",
                self.images.successful, self.images.failed
            );
        }

        if !p.skipped_rows.is_empty() {
            let lines: Vec<String> = p
                .skipped_rows
                .iter()
                .map(|s| format!("{}: {}", row_label(s.row, s.batch_first_row), s.email))
                .collect();
            push_section(&mut out, "Skipped rows", &lines);
        }

        if !p.errors.is_empty() {
            let lines: Vec<String> = p
                .errors
                .iter()
                .map(|e| format!("{}: {}", row_label(e.row, e.batch_first_row), e.message))
                .collect();
            push_section(&mut out, "Errors", &lines);
        }

        if !self.images.failures.is_empty() {
            let lines: Vec<String> = self
                .images
                .failures
                .iter()
                .map(|f| format!("{}: {}", f.profile_id, f.reason))
                .collect();
            push_section(&mut out, "Image failures", &lines);
        }

        out
    }
}

/// Mapping table, first rows with their validation status, and the valid count
///
/// Empty before upload.
pub fn render_preview(session: &ImportSession) -> String {
    let mut out = String::new();
    let Some(parsed) = session.parsed() else {
        return out;
    };

    let _ = writeln!(out, "Column mappings:");
    for (header, mapping) in parsed.headers.iter().zip(session.mappings()) {
        let target = match mapping.target() {
            Some(field) => field.label(),
            None => "(skip)",
        };
        let _ = writeln!(out, "  {:<30} -> {}", header, target);
    }

    let preview = mapped_preview(parsed, session.mappings(), DEFAULT_PREVIEW_ROWS);
    let _ = writeln!(out, "\nFirst {} rows:", preview.len());
    for (i, (row, validation)) in preview.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:>3}. {:<35} {:<25} [{}]",
            i + 1,
            row.email.as_deref().unwrap_or("-"),
            row.full_name.as_deref().unwrap_or("-"),
            validation.reason().unwrap_or("ok")
        );
    }

    let _ = writeln!(
        out,
        "\n{} of {} rows valid",
        session.valid_row_count(),
        session.total_row_count()
    );
    out
}

fn push_section(out: &mut String, title: &str, lines: &[String]) {
    let _ = writeln!(out, "\n{}:", title);
    for line in capped(lines, DETAIL_LIMIT) {
        let _ = writeln!(out, "  {}", line);
    }
}

/// First `limit` lines plus an "...and N more" line when truncated
pub fn capped(lines: &[String], limit: usize) -> Vec<String> {
    let mut shown: Vec<String> = lines.iter().take(limit).cloned().collect();
    if lines.len() > limit {
        shown.push(format!("...and {} more", lines.len() - limit));
    }
    shown
}

//! Import workflow state machine
//!
//! An import session progresses through 4 states:
//! UPLOAD → MAPPING → IMPORTING → COMPLETE
//!
//! `reset` returns to UPLOAD from any state and discards everything the
//! session holds. No other backward transition exists.

use crate::error::{SessionError, SessionResult};
use crate::ingest::{self, ParsedCsv};
use crate::models::{BulkImportResult, FieldMapping, ImageSummary, JournalistRow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

/// Import workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImportState {
    /// Waiting for a CSV file
    Upload,
    /// File parsed, operator reviewing column mappings
    Mapping,
    /// Phase 1 (profiles) then Phase 2 (images) running
    Importing,
    /// Both phases finished
    Complete,
}

impl ImportState {
    /// Forward transitions allowed by the state machine (reset excluded)
    fn can_advance_to(self, next: ImportState) -> bool {
        matches!(
            (self, next),
            (ImportState::Upload, ImportState::Mapping)
                | (ImportState::Mapping, ImportState::Importing)
                | (ImportState::Importing, ImportState::Complete)
        )
    }
}

impl fmt::Display for ImportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportState::Upload => "upload",
            ImportState::Mapping => "mapping",
            ImportState::Importing => "importing",
            ImportState::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// State transition record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub session_id: Uuid,
    pub old_state: ImportState,
    pub new_state: ImportState,
    pub transitioned_at: DateTime<Utc>,
}

/// Progress of one import phase
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhaseProgress {
    /// Items processed so far (never exceeds `total`)
    pub current: usize,

    /// Items in the phase, fixed when the phase starts
    pub total: usize,

    /// Percentage complete (0.0 - 100.0)
    pub percentage: f64,

    /// Phase 2 only: items stored
    pub successful: usize,

    /// Phase 2 only: items failed
    pub failed: usize,

    /// Elapsed time (seconds)
    pub elapsed_seconds: u64,

    /// Estimated remaining time (seconds), None if unknown
    pub estimated_remaining_seconds: Option<u64>,

    /// When the phase started
    pub started_at: Option<DateTime<Utc>>,
}

impl PhaseProgress {
    /// Start tracking a phase of `total` items
    pub fn start(total: usize) -> Self {
        Self {
            total,
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Record processed count, clamped to the phase total
    pub fn update(&mut self, processed: usize) {
        self.current = processed.min(self.total);
        self.percentage = if self.total > 0 {
            (self.current as f64 / self.total as f64) * 100.0
        } else {
            100.0
        };

        let elapsed = self
            .started_at
            .map(|start| (Utc::now() - start).num_seconds().max(0) as u64)
            .unwrap_or(0);
        self.elapsed_seconds = elapsed;

        // Estimate remaining time
        if self.current > 0 && self.total > self.current {
            let rate = elapsed as f64 / self.current as f64;
            self.estimated_remaining_seconds =
                Some(((self.total - self.current) as f64 * rate) as u64);
        } else {
            self.estimated_remaining_seconds = None;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.current >= self.total
    }
}

/// Import session (in-memory state of one operator's import run)
///
/// Owns every entity of the run: parsed file, mappings, progress and results.
/// Nothing is persisted; dropping the session loses the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSession {
    /// Unique session identifier
    pub session_id: Uuid,

    /// Current workflow state
    pub state: ImportState,

    /// Name of the uploaded file, if known
    pub source_name: Option<String>,

    /// Parsed CSV (present from MAPPING on)
    parsed: Option<ParsedCsv>,

    /// One mapping per header
    mappings: Vec<FieldMapping>,

    /// Phase 1 progress ("Importing Profiles")
    pub profile_progress: PhaseProgress,

    /// Phase 2 progress ("Processing Images")
    pub image_progress: PhaseProgress,

    /// Phase 1 aggregate (present once COMPLETE)
    pub import_result: Option<BulkImportResult>,

    /// Phase 2 aggregate (present once COMPLETE)
    pub image_summary: Option<ImageSummary>,

    /// Last operator-visible error
    pub last_error: Option<String>,

    /// When IMPORTING started
    pub started_at: Option<DateTime<Utc>>,

    /// When COMPLETE was reached
    pub ended_at: Option<DateTime<Utc>>,
}

impl Default for ImportSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportSession {
    /// Create new import session in UPLOAD
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            state: ImportState::Upload,
            source_name: None,
            parsed: None,
            mappings: Vec::new(),
            profile_progress: PhaseProgress::default(),
            image_progress: PhaseProgress::default(),
            import_result: None,
            image_summary: None,
            last_error: None,
            started_at: None,
            ended_at: None,
        }
    }

    /// Parse uploaded CSV text and move to MAPPING with auto-detected mappings
    ///
    /// On a parse error the session stays in UPLOAD and records the message.
    pub fn upload(&mut self, text: &str, source_name: Option<String>) -> SessionResult<StateTransition> {
        self.require_transition(ImportState::Mapping)?;

        match ingest::parse(text) {
            Ok(parsed) => Ok(self.accept_parsed(parsed, source_name)),
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Read and parse a `.csv` file, then move to MAPPING
    pub fn upload_file(&mut self, path: &Path) -> SessionResult<StateTransition> {
        self.require_transition(ImportState::Mapping)?;

        match ingest::parse_file(path) {
            Ok(parsed) => {
                let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
                Ok(self.accept_parsed(parsed, name))
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    fn accept_parsed(&mut self, parsed: ParsedCsv, source_name: Option<String>) -> StateTransition {
        self.mappings = ingest::auto_detect_mappings(&parsed.headers);
        self.parsed = Some(parsed);
        self.source_name = source_name;
        self.last_error = None;
        self.transition_to(ImportState::Mapping)
    }

    /// Parsed file, if any
    pub fn parsed(&self) -> Option<&ParsedCsv> {
        self.parsed.as_ref()
    }

    /// Current column mappings
    pub fn mappings(&self) -> &[FieldMapping] {
        &self.mappings
    }

    /// Override the mapping of one column (MAPPING only)
    pub fn set_mapping(&mut self, index: usize, mapping: FieldMapping) -> SessionResult<()> {
        self.require(ImportState::Mapping, "set_mapping")?;

        let slot = self
            .mappings
            .get_mut(index)
            .ok_or(SessionError::UnknownColumn(index))?;
        *slot = mapping;
        Ok(())
    }

    /// Override the mapping of the first column whose header matches `header`
    /// (case-insensitive, surrounding whitespace ignored)
    pub fn set_mapping_by_header(&mut self, header: &str, mapping: FieldMapping) -> SessionResult<()> {
        self.require(ImportState::Mapping, "set_mapping")?;

        let wanted = header.trim();
        let index = self
            .parsed
            .as_ref()
            .and_then(|p| p.headers.iter().position(|h| h.trim().eq_ignore_ascii_case(wanted)))
            .ok_or_else(|| SessionError::UnknownHeader(wanted.to_string()))?;
        self.set_mapping(index, mapping)
    }

    /// Every row projected through the current mappings
    pub fn mapped_rows(&self) -> Vec<JournalistRow> {
        self.parsed
            .as_ref()
            .map(|p| ingest::apply_mapping(p, &self.mappings))
            .unwrap_or_default()
    }

    /// Rows that pass validation under the current mappings
    pub fn valid_rows(&self) -> Vec<JournalistRow> {
        self.mapped_rows()
            .into_iter()
            .filter(|row| ingest::validate_row(row).valid)
            .collect()
    }

    /// Live "N of M rows valid" numerator; 0 before upload
    pub fn valid_row_count(&self) -> usize {
        self.valid_rows().len()
    }

    /// Total parsed data rows; 0 before upload
    pub fn total_row_count(&self) -> usize {
        self.parsed.as_ref().map_or(0, |p| p.rows.len())
    }

    /// Confirm the mappings and move to IMPORTING
    ///
    /// Returns the rows to submit. With zero valid rows the session stays in
    /// MAPPING and `NoValidRows` is returned.
    pub fn begin_import(&mut self) -> SessionResult<Vec<JournalistRow>> {
        self.require_transition(ImportState::Importing)?;

        let rows = self.valid_rows();
        if rows.is_empty() {
            self.last_error = Some(SessionError::NoValidRows.to_string());
            return Err(SessionError::NoValidRows);
        }

        self.transition_to(ImportState::Importing);
        self.started_at = Some(Utc::now());
        self.last_error = None;
        self.profile_progress = PhaseProgress::start(rows.len());
        self.image_progress = PhaseProgress::default();
        Ok(rows)
    }

    /// Start Phase 2 progress tracking
    pub fn begin_image_phase(&mut self, total: usize) {
        self.image_progress = PhaseProgress::start(total);
        self.image_progress.update(0);
    }

    /// Record Phase 1 progress
    pub fn update_profile_progress(&mut self, processed: usize) {
        self.profile_progress.update(processed);
    }

    /// Record Phase 2 progress
    pub fn update_image_progress(&mut self, summary: &ImageSummary) {
        self.image_progress.successful = summary.successful;
        self.image_progress.failed = summary.failed;
        self.image_progress.update(summary.processed());
    }

    /// Store both phase aggregates and move to COMPLETE
    pub fn complete(
        &mut self,
        result: BulkImportResult,
        images: ImageSummary,
    ) -> SessionResult<StateTransition> {
        self.require_transition(ImportState::Complete)?;

        self.import_result = Some(result);
        self.image_summary = Some(images);
        Ok(self.transition_to(ImportState::Complete))
    }

    /// Discard everything and return to UPLOAD (allowed from any state)
    pub fn reset(&mut self) -> StateTransition {
        self.parsed = None;
        self.mappings.clear();
        self.source_name = None;
        self.profile_progress = PhaseProgress::default();
        self.image_progress = PhaseProgress::default();
        self.import_result = None;
        self.image_summary = None;
        self.last_error = None;
        self.started_at = None;
        self.ended_at = None;
        self.transition_to(ImportState::Upload)
    }

    /// Session duration in seconds (0 until IMPORTING started)
    pub fn duration_seconds(&self) -> u64 {
        match self.started_at {
            Some(start) => {
                let end = self.ended_at.unwrap_or_else(Utc::now);
                (end - start).num_seconds().max(0) as u64
            }
            None => 0,
        }
    }

    fn require_transition(&self, to: ImportState) -> SessionResult<()> {
        if self.state.can_advance_to(to) {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition { from: self.state, to })
        }
    }

    fn require(&self, state: ImportState, operation: &'static str) -> SessionResult<()> {
        if self.state == state {
            Ok(())
        } else {
            Err(SessionError::WrongState {
                operation,
                state: self.state,
            })
        }
    }

    /// Transition to new state
    fn transition_to(&mut self, new_state: ImportState) -> StateTransition {
        let transition = StateTransition {
            session_id: self.session_id,
            old_state: self.state,
            new_state,
            transitioned_at: Utc::now(),
        };
        self.state = new_state;

        if new_state == ImportState::Complete {
            self.ended_at = Some(transition.transitioned_at);
        }

        tracing::debug!(
            session_id = %self.session_id,
            from = %transition.old_state,
            to = %new_state,
            "Import session transition"
        );

        transition
    }
}

//! Error types for cj-import

use crate::ingest::ParseError;
use crate::models::ImportState;
use thiserror::Error;

/// Errors raised by import session operations
///
/// Per-batch remote failures never show up here: the import phases absorb
/// them into the run's results.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Upload step failed; the session stays in `upload`
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Upload, import or completion attempted out of order
    #[error("Cannot move import from {from} to {to}")]
    InvalidTransition { from: ImportState, to: ImportState },

    /// Mapping edit outside `mapping`
    #[error("Operation '{operation}' not allowed while {state}")]
    WrongState {
        operation: &'static str,
        state: ImportState,
    },

    /// Mapping confirmed with no importable row; the session stays in `mapping`
    #[error("No valid rows to import")]
    NoValidRows,

    /// Column index outside the parsed header row
    #[error("Unknown column index {0}")]
    UnknownColumn(usize),

    /// Header name not present in the parsed header row
    #[error("Unknown column '{0}'")]
    UnknownHeader(String),
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

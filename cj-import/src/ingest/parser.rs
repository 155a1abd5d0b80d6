//! CSV parsing
//!
//! Comma separated, optional double quotes (`""` escapes a quote), values
//! trimmed, blank lines ignored. The first non-blank line is the header row.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Upload-step errors
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("CSV file is empty")]
    Empty,

    #[error("CSV file has no header row")]
    MissingHeader,

    #[error("Invalid CSV: {0}")]
    Malformed(String),

    #[error("Please upload a CSV file (got '{0}')")]
    NotCsv(String),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

/// Parsed CSV file
///
/// Row cells are aligned with `headers` by index; rows may be shorter or
/// longer than the header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Parse CSV text into headers and rows
pub fn parse(text: &str) -> Result<ParsedCsv, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| ParseError::Malformed(e.to_string()))?;

        // Whitespace-only line
        if record.len() == 1 && record[0].is_empty() {
            continue;
        }

        records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    let mut records = records.into_iter();
    let headers = records.next().ok_or(ParseError::Empty)?;
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ParseError::MissingHeader);
    }

    Ok(ParsedCsv {
        headers,
        rows: records.collect(),
    })
}

/// Read a `.csv` file and parse it
pub fn parse_file(path: &Path) -> Result<ParsedCsv, ParseError> {
    let is_csv = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if !is_csv {
        return Err(ParseError::NotCsv(path.display().to_string()));
    }

    let bytes = std::fs::read(path)?;
    let text = String::from_utf8(bytes)
        .map_err(|_| ParseError::Malformed("file is not valid UTF-8".to_string()))?;

    // Spreadsheet exports often start with a byte order mark
    parse(text.trim_start_matches('\u{feff}'))
}

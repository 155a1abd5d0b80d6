//! CSV ingest: parsing, column mapping, row validation
//!
//! Everything here is pure: no network, no session state.

pub mod mapping;
pub mod parser;
pub mod screenshot;
pub mod validator;

pub use mapping::{
    apply_mapping, auto_detect_mappings, detect_field, duplicate_mappings, map_row,
    mapped_preview, DEFAULT_PREVIEW_ROWS,
};
pub use parser::{parse, parse_file, ParseError, ParsedCsv};
pub use screenshot::{count_drive_screenshots, drive_download_url, extract_drive_file_id, is_google_drive_link};
pub use validator::{is_valid_url, validate_row, RowValidation};

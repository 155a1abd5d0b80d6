//! Column mapping: header auto-detection and row projection

use super::parser::ParsedCsv;
use super::validator::{validate_row, RowValidation};
use crate::models::{FieldMapping, JournalistRow, TargetField};

/// Rows shown in the mapping preview table
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Guess a mapping for every header
///
/// Deterministic, case-insensitive substring matching. Rules are checked in
/// order and the first hit wins, so "Outlet Name" maps to `full_name`.
/// `email_screenshot` is never guessed.
pub fn auto_detect_mappings(headers: &[String]) -> Vec<FieldMapping> {
    headers.iter().map(|h| detect_field(h)).collect()
}

/// Guess the mapping of a single header
pub fn detect_field(header: &str) -> FieldMapping {
    let h = header.trim().to_lowercase();
    let has = |needle: &str| h.contains(needle);

    let field = if has("name") || h == "full name" || h == "fullname" {
        TargetField::FullName
    } else if has("email") || has("mail") {
        TargetField::Email
    } else if has("press") || has("publication") || has("outlet") {
        TargetField::Press
    } else if has("company") || has("org") {
        TargetField::Company
    } else if has("website") || has("url") || has("site") {
        TargetField::Website
    } else if has("linkedin") || h == "li" {
        TargetField::Linkedin
    } else if has("twitter") || has("x_handle") || has("x handle") || h == "x" {
        TargetField::XHandle
    } else if has("category") || has("categories") || has("beat") {
        TargetField::Categories
    } else {
        return FieldMapping::Skip;
    };

    FieldMapping::Field(field)
}

/// Project every parsed row through `mappings`
pub fn apply_mapping(parsed: &ParsedCsv, mappings: &[FieldMapping]) -> Vec<JournalistRow> {
    parsed.rows.iter().map(|cells| map_row(cells, mappings)).collect()
}

/// Project one row
///
/// Skipped columns and blank cells are ignored. When several columns map to
/// the same field, the rightmost non-blank one wins.
pub fn map_row(cells: &[String], mappings: &[FieldMapping]) -> JournalistRow {
    let mut row = JournalistRow::default();

    for (mapping, cell) in mappings.iter().zip(cells) {
        let Some(field) = mapping.target() else {
            continue;
        };
        let value = cell.trim();
        if value.is_empty() {
            continue;
        }
        row.set(field, value.to_string());
    }

    row
}

/// Fields mapped by more than one column, in first-seen order
pub fn duplicate_mappings(mappings: &[FieldMapping]) -> Vec<TargetField> {
    let mut seen: Vec<TargetField> = Vec::new();
    let mut duplicates: Vec<TargetField> = Vec::new();

    for field in mappings.iter().filter_map(FieldMapping::target) {
        if seen.contains(&field) {
            if !duplicates.contains(&field) {
                duplicates.push(field);
            }
        } else {
            seen.push(field);
        }
    }

    duplicates
}

/// First `limit` rows projected and validated, for the mapping table
pub fn mapped_preview(
    parsed: &ParsedCsv,
    mappings: &[FieldMapping],
    limit: usize,
) -> Vec<(JournalistRow, RowValidation)> {
    parsed
        .rows
        .iter()
        .take(limit)
        .map(|cells| {
            let row = map_row(cells, mappings);
            let validation = validate_row(&row);
            (row, validation)
        })
        .collect()
}

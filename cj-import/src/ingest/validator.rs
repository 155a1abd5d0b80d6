//! Row validation
//!
//! A row is importable when it carries a well-formed email. Other fields are
//! optional, but `website` and `linkedin` must look like URLs when present.

use crate::models::JournalistRow;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use serde::{Deserialize, Serialize};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Validation verdict for one mapped row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowValidation {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl RowValidation {
    /// First problem found, if any
    pub fn reason(&self) -> Option<&str> {
        self.errors.first().map(String::as_str)
    }
}

/// Validate a mapped row
pub fn validate_row(row: &JournalistRow) -> RowValidation {
    let mut errors = Vec::new();

    match row.email.as_deref().map(str::trim) {
        None | Some("") => errors.push("Missing email".to_string()),
        Some(email) if !EMAIL_RE.is_match(email) => {
            errors.push("Invalid email format".to_string())
        }
        Some(_) => {}
    }

    if let Some(website) = row.website.as_deref() {
        if !is_valid_url(website) {
            errors.push("Invalid website URL".to_string());
        }
    }

    if let Some(linkedin) = row.linkedin.as_deref() {
        if !is_valid_url(linkedin) {
            errors.push("Invalid LinkedIn URL".to_string());
        }
    }

    RowValidation {
        valid: errors.is_empty(),
        errors,
    }
}

/// URL check that tolerates a missing scheme ("paper.com/jane")
pub fn is_valid_url(value: &str) -> bool {
    let value = value.trim();
    let candidate = if value.starts_with("http") {
        value.to_string()
    } else {
        format!("https://{}", value)
    };
    Url::parse(&candidate).is_ok()
}

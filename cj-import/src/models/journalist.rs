//! Journalist profile fields and the mapped import row

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Profile field a CSV column can be mapped onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetField {
    FullName,
    Email,
    /// Publication / outlet
    Press,
    Company,
    Website,
    Linkedin,
    XHandle,
    Categories,
    /// URL of an email-proof screenshot (Google Drive link or direct image URL)
    EmailScreenshot,
}

impl TargetField {
    /// All fields, in the order the mapping table offers them
    pub const ALL: [TargetField; 9] = [
        TargetField::FullName,
        TargetField::Email,
        TargetField::Press,
        TargetField::Company,
        TargetField::Website,
        TargetField::Linkedin,
        TargetField::XHandle,
        TargetField::Categories,
        TargetField::EmailScreenshot,
    ];

    /// Wire / CLI name
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetField::FullName => "full_name",
            TargetField::Email => "email",
            TargetField::Press => "press",
            TargetField::Company => "company",
            TargetField::Website => "website",
            TargetField::Linkedin => "linkedin",
            TargetField::XHandle => "x_handle",
            TargetField::Categories => "categories",
            TargetField::EmailScreenshot => "email_screenshot",
        }
    }

    /// Operator-facing label
    pub fn label(&self) -> &'static str {
        match self {
            TargetField::FullName => "Full Name",
            TargetField::Email => "Email",
            TargetField::Press => "Publication/Press",
            TargetField::Company => "Company",
            TargetField::Website => "Website",
            TargetField::Linkedin => "LinkedIn",
            TargetField::XHandle => "X Handle",
            TargetField::Categories => "Categories",
            TargetField::EmailScreenshot => "Email Screenshot (Image URL)",
        }
    }
}

impl fmt::Display for TargetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        TargetField::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown field '{}' (expected one of: {}, skip)",
                    s,
                    TargetField::ALL.map(|f| f.as_str()).join(", ")
                )
            })
    }
}

/// Mapping decision for one CSV column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldMapping {
    /// Copy the column into this profile field
    Field(TargetField),
    /// Ignore the column
    Skip,
}

impl FieldMapping {
    /// Target field, `None` for skipped columns
    pub fn target(&self) -> Option<TargetField> {
        match self {
            FieldMapping::Field(field) => Some(*field),
            FieldMapping::Skip => None,
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, FieldMapping::Skip)
    }
}

impl fmt::Display for FieldMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldMapping::Field(field) => field.fmt(f),
            FieldMapping::Skip => f.write_str("skip"),
        }
    }
}

impl FromStr for FieldMapping {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("skip") {
            Ok(FieldMapping::Skip)
        } else {
            s.parse().map(FieldMapping::Field)
        }
    }
}

impl From<TargetField> for FieldMapping {
    fn from(field: TargetField) -> Self {
        FieldMapping::Field(field)
    }
}

/// One CSV row projected onto profile fields
///
/// Serialized in the shape the bulk-import endpoint expects: snake_case keys,
/// absent fields omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalistRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub press: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_screenshot: Option<String>,
}

impl JournalistRow {
    /// Row carrying only an email, the minimum importable row
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Default::default()
        }
    }

    /// Store a single-valued field
    ///
    /// `Categories` is split on `,` / `;` (see [`split_categories`]).
    pub fn set(&mut self, field: TargetField, value: String) {
        match field {
            TargetField::FullName => self.full_name = Some(value),
            TargetField::Email => self.email = Some(value),
            TargetField::Press => self.press = Some(value),
            TargetField::Company => self.company = Some(value),
            TargetField::Website => self.website = Some(value),
            TargetField::Linkedin => self.linkedin = Some(value),
            TargetField::XHandle => self.x_handle = Some(value),
            TargetField::Categories => self.categories = split_categories(&value),
            TargetField::EmailScreenshot => self.email_screenshot = Some(value),
        }
    }

    /// Display value of a field, categories joined with ", "
    pub fn get(&self, field: TargetField) -> Option<String> {
        match field {
            TargetField::FullName => self.full_name.clone(),
            TargetField::Email => self.email.clone(),
            TargetField::Press => self.press.clone(),
            TargetField::Company => self.company.clone(),
            TargetField::Website => self.website.clone(),
            TargetField::Linkedin => self.linkedin.clone(),
            TargetField::XHandle => self.x_handle.clone(),
            TargetField::Categories => {
                (!self.categories.is_empty()).then(|| self.categories.join(", "))
            }
            TargetField::EmailScreenshot => self.email_screenshot.clone(),
        }
    }
}

/// Split a categories cell on commas and semicolons, dropping blanks
pub fn split_categories(value: &str) -> Vec<String> {
    value
        .split([',', ';'])
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

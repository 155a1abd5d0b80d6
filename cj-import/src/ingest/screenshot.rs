//! Email screenshot links
//!
//! Operators usually paste Google Drive share links for email-proof
//! screenshots. The backend only downloads those; other URLs are stored as-is.

use crate::models::JournalistRow;
use once_cell::sync::Lazy;
use regex::Regex;

static FILE_PATH_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/file/d/([a-zA-Z0-9_-]+)").expect("file id pattern is valid"));

static QUERY_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&]id=([a-zA-Z0-9_-]+)").expect("query id pattern is valid"));

/// Google Drive view/share link (`/file/d/<id>` or `open?id=<id>`)
pub fn is_google_drive_link(url: &str) -> bool {
    url.contains("drive.google.com/file/d/") || url.contains("drive.google.com/open?id=")
}

/// File id of a Drive link
pub fn extract_drive_file_id(url: &str) -> Option<&str> {
    FILE_PATH_ID
        .captures(url)
        .or_else(|| QUERY_ID.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Direct-download URL for a Drive file id
pub fn drive_download_url(file_id: &str) -> String {
    format!("https://drive.google.com/uc?export=download&id={}", file_id)
}

/// Rows whose screenshot the backend will queue for download
pub fn count_drive_screenshots(rows: &[JournalistRow]) -> usize {
    rows.iter()
        .filter_map(|row| row.email_screenshot.as_deref())
        .filter(|url| is_google_drive_link(url))
        .count()
}

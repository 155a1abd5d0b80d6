//! In-memory journalist directory
//!
//! A `JournalistAdmin` that keeps profiles in process memory with the hosted
//! backend's semantics: email is unique, a duplicate is skipped rather than
//! inserted, and only Google Drive screenshots are queued for processing.
//! Backs `--dry-run` and the integration tests.

use crate::ingest::{drive_download_url, extract_drive_file_id, is_google_drive_link};
use crate::models::{
    BulkImportResult, FailedImage, ImageBatchResult, JournalistRow, PendingImage, SkippedRow,
};
use crate::services::admin_client::{JournalistAdmin, RemoteError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StoredProfile {
    row: JournalistRow,
    /// Stored screenshot location once processed
    screenshot_url: Option<String>,
}

#[derive(Default)]
struct Directory {
    /// Profile id by email
    by_email: HashMap<String, String>,
    profiles: HashMap<String, StoredProfile>,
}

/// In-memory `JournalistAdmin`
#[derive(Default)]
pub struct MemoryAdmin {
    directory: Mutex<Directory>,
    unreachable_images: HashSet<String>,
}

impl MemoryAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make downloads of `url` fail
    pub fn with_unreachable_image(mut self, url: impl Into<String>) -> Self {
        self.unreachable_images.insert(url.into());
        self
    }

    /// Number of stored profiles
    pub async fn profile_count(&self) -> usize {
        self.directory.lock().await.profiles.len()
    }

    /// Stored row for `email`, if a profile exists
    pub async fn profile(&self, email: &str) -> Option<JournalistRow> {
        let directory = self.directory.lock().await;
        let id = directory.by_email.get(email.trim())?;
        directory.profiles.get(id).map(|p| p.row.clone())
    }

    /// Stored screenshot location of a processed profile
    pub async fn stored_screenshot(&self, profile_id: &str) -> Option<String> {
        self.directory
            .lock()
            .await
            .profiles
            .get(profile_id)
            .and_then(|p| p.screenshot_url.clone())
    }
}

fn drive_screenshot(row: &JournalistRow) -> Option<&str> {
    row.email_screenshot
        .as_deref()
        .filter(|url| is_google_drive_link(url))
}

#[async_trait]
impl JournalistAdmin for MemoryAdmin {
    async fn bulk_import_journalists(
        &self,
        rows: &[JournalistRow],
    ) -> Result<BulkImportResult, RemoteError> {
        let mut directory = self.directory.lock().await;
        let mut result = BulkImportResult::new();

        for (i, row) in rows.iter().enumerate() {
            let email = row.email.as_deref().map(str::trim).unwrap_or_default();

            if let Some(existing_id) = directory.by_email.get(email).cloned() {
                result.skipped += 1;
                result.skipped_rows.push(SkippedRow::new(
                    i + 1,
                    if email.is_empty() { "unknown" } else { email },
                ));
                if let Some(url) = drive_screenshot(row) {
                    result.profiles_with_images.push(PendingImage {
                        profile_id: existing_id,
                        url: url.to_string(),
                    });
                }
                continue;
            }

            let profile_id = Uuid::new_v4().to_string();
            directory.by_email.insert(email.to_string(), profile_id.clone());
            directory.profiles.insert(
                profile_id.clone(),
                StoredProfile {
                    row: row.clone(),
                    screenshot_url: row.email_screenshot.clone(),
                },
            );
            result.records_inserted += 1;

            if let Some(url) = drive_screenshot(row) {
                result.profiles_with_images.push(PendingImage {
                    profile_id,
                    url: url.to_string(),
                });
            }
        }

        tracing::debug!(
            inserted = result.records_inserted,
            skipped = result.skipped,
            "In-memory bulk import"
        );

        Ok(result)
    }

    async fn process_image_batch(
        &self,
        items: &[PendingImage],
    ) -> Result<ImageBatchResult, RemoteError> {
        let mut directory = self.directory.lock().await;
        let mut result = ImageBatchResult::default();

        for item in items {
            let Some(profile) = directory.profiles.get_mut(&item.profile_id) else {
                result.failed.push(FailedImage {
                    profile_id: item.profile_id.clone(),
                    error: "Profile not found".to_string(),
                });
                continue;
            };

            if !is_google_drive_link(&item.url) {
                result.successful.push(item.profile_id.clone());
                continue;
            }

            match extract_drive_file_id(&item.url) {
                Some(file_id) if !self.unreachable_images.contains(&item.url) => {
                    profile.screenshot_url = Some(drive_download_url(file_id));
                    result.successful.push(item.profile_id.clone());
                }
                _ => result.failed.push(FailedImage {
                    profile_id: item.profile_id.clone(),
                    error: "Failed to download/upload image".to_string(),
                }),
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(email: &str, screenshot: Option<&str>) -> JournalistRow {
        let mut row = JournalistRow::with_email(email);
        row.email_screenshot = screenshot.map(str::to_string);
        row
    }

    const DRIVE: &str = "https://drive.google.com/file/d/abc123/view";

    #[tokio::test]
    async fn test_duplicate_email_is_skipped() {
        let admin = MemoryAdmin::new();
        let first = admin
            .bulk_import_journalists(&[row("a@b.com", None), row("c@d.com", None)])
            .await
            .unwrap();
        assert_eq!(first.records_inserted, 2);

        let second = admin
            .bulk_import_journalists(&[row("x@y.com", None), row("a@b.com", None)])
            .await
            .unwrap();
        assert_eq!(second.records_inserted, 1);
        assert_eq!(second.skipped, 1);
        assert_eq!(second.skipped_rows, vec![SkippedRow::new(2, "a@b.com")]);
        assert_eq!(admin.profile_count().await, 3);
    }

    #[tokio::test]
    async fn test_duplicate_within_one_batch_is_skipped() {
        let admin = MemoryAdmin::new();
        let result = admin
            .bulk_import_journalists(&[row("a@b.com", None), row("a@b.com", None)])
            .await
            .unwrap();
        assert_eq!(result.records_inserted, 1);
        assert_eq!(result.skipped, 1);
    }

    #[tokio::test]
    async fn test_only_drive_screenshots_are_queued() {
        let admin = MemoryAdmin::new();
        let result = admin
            .bulk_import_journalists(&[
                row("a@b.com", Some(DRIVE)),
                row("c@d.com", Some("https://cdn.example.com/x.png")),
            ])
            .await
            .unwrap();
        assert_eq!(result.profiles_with_images.len(), 1);
        assert_eq!(result.profiles_with_images[0].url, DRIVE);

        // Re-import still queues the existing profile's screenshot
        let again = admin
            .bulk_import_journalists(&[row("a@b.com", Some(DRIVE))])
            .await
            .unwrap();
        assert_eq!(again.skipped, 1);
        assert_eq!(again.profiles_with_images, result.profiles_with_images);
    }

    #[tokio::test]
    async fn test_process_images() {
        let broken = "https://drive.google.com/file/d/broken/view";
        let admin = MemoryAdmin::new().with_unreachable_image(broken);
        let imported = admin
            .bulk_import_journalists(&[row("a@b.com", Some(DRIVE)), row("c@d.com", Some(broken))])
            .await
            .unwrap();

        let mut items = imported.profiles_with_images.clone();
        items.push(PendingImage {
            profile_id: "missing".into(),
            url: DRIVE.into(),
        });

        let result = admin.process_image_batch(&items).await.unwrap();
        assert_eq!(result.successful, vec![items[0].profile_id.clone()]);
        assert_eq!(result.failed.len(), 2);
        assert_eq!(result.failed[0].error, "Failed to download/upload image");
        assert_eq!(result.failed[1].error, "Profile not found");
        assert_eq!(
            admin.stored_screenshot(&items[0].profile_id).await.as_deref(),
            Some("https://drive.google.com/uc?export=download&id=abc123")
        );
    }
}

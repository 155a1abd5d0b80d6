//! Shared test utilities for cj-import integration tests

#![allow(dead_code)]

pub mod log_capture;

use async_trait::async_trait;
use cj_import::models::{BulkImportResult, ImageBatchResult, ImportSession, JournalistRow, PendingImage};
use cj_import::services::{JournalistAdmin, MemoryAdmin, RemoteError};
use std::collections::HashSet;
use std::fmt::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Remote call recorded by `ScriptedAdmin`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    BulkImport { rows: usize, first_email: Option<String> },
    ProcessImages { items: usize },
}

/// How `ScriptedAdmin` answers image batches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMode {
    /// Defer to the in-memory directory
    Delegate,
    /// Every call fails with a server error
    FailCalls,
    /// Answer with empty lists (every item unreported)
    Silent,
}

/// `JournalistAdmin` over a `MemoryAdmin` with scripted failures
///
/// Call indices are 0-based per operation.
pub struct ScriptedAdmin {
    pub inner: MemoryAdmin,
    failing_bulk_calls: HashSet<usize>,
    image_mode: ImageMode,
    calls: Mutex<Vec<Call>>,
    bulk_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedAdmin {
    pub fn new() -> Self {
        Self::over(MemoryAdmin::new())
    }

    pub fn over(inner: MemoryAdmin) -> Self {
        Self {
            inner,
            failing_bulk_calls: HashSet::new(),
            image_mode: ImageMode::Delegate,
            calls: Mutex::new(Vec::new()),
            bulk_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn failing_bulk_call(mut self, index: usize) -> Self {
        self.failing_bulk_calls.insert(index);
        self
    }

    pub fn with_image_mode(mut self, mode: ImageMode) -> Self {
        self.image_mode = mode;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn bulk_batch_sizes(&self) -> Vec<usize> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::BulkImport { rows, .. } => Some(rows),
                _ => None,
            })
            .collect()
    }

    pub fn image_batch_sizes(&self) -> Vec<usize> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::ProcessImages { items } => Some(items),
                _ => None,
            })
            .collect()
    }

    /// Highest number of calls observed in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        // Give an overlapping caller the chance to show up
        tokio::task::yield_now().await;
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl JournalistAdmin for ScriptedAdmin {
    async fn bulk_import_journalists(
        &self,
        rows: &[JournalistRow],
    ) -> Result<BulkImportResult, RemoteError> {
        self.enter(Call::BulkImport {
            rows: rows.len(),
            first_email: rows.first().and_then(|r| r.email.clone()),
        })
        .await;

        let index = self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        let result = if self.failing_bulk_calls.contains(&index) {
            Err(RemoteError::Api {
                status: 500,
                message: "Internal server error".to_string(),
            })
        } else {
            self.inner.bulk_import_journalists(rows).await
        };

        self.leave();
        result
    }

    async fn process_image_batch(
        &self,
        items: &[PendingImage],
    ) -> Result<ImageBatchResult, RemoteError> {
        self.enter(Call::ProcessImages { items: items.len() }).await;

        let result = match self.image_mode {
            ImageMode::Delegate => self.inner.process_image_batch(items).await,
            ImageMode::FailCalls => Err(RemoteError::Network("connection refused".to_string())),
            ImageMode::Silent => Ok(ImageBatchResult::default()),
        };

        self.leave();
        result
    }
}

pub const DRIVE_PREFIX: &str = "https://drive.google.com/file/d/";

/// CSV with `rows` data rows
///
/// Columns: Name, Email, Outlet, Screenshot. Rows where `invalid(i)` holds
/// have no email; rows where `with_image(i)` holds carry a Drive screenshot.
pub fn journalist_csv(
    rows: usize,
    invalid: impl Fn(usize) -> bool,
    with_image: impl Fn(usize) -> bool,
) -> String {
    let mut csv = String::from("Name,Email,Outlet,Screenshot\n");
    for i in 0..rows {
        let email = if invalid(i) { String::new() } else { format!("user{}@paper.com", i) };
        let screenshot = if with_image(i) {
            format!("{}f{}/view", DRIVE_PREFIX, i)
        } else {
            String::new()
        };
        let _ = writeln!(csv, "\"Journalist {}\",{},The Paper,{}", i, email, screenshot);
    }
    csv
}

/// Session in MAPPING with the screenshot column mapped
pub fn mapped_session(csv: &str) -> ImportSession {
    let mut session = ImportSession::new();
    session.upload(csv, Some("journalists.csv".to_string())).unwrap();
    session
        .set_mapping_by_header("Screenshot", "email_screenshot".parse().unwrap())
        .unwrap();
    session
}

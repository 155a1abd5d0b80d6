//! Admin backend client
//!
//! The hosted backend exposes journalist management as one function endpoint
//! taking `{ "action": ..., "data": ... }`. The import pipeline needs two
//! actions: `bulk_import` and `process_images`.

use crate::models::{BulkImportResult, ImageBatchResult, JournalistRow, PendingImage};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const FUNCTION_PATH: &str = "/functions/v1/admin-manage-journalists";
const USER_AGENT: &str = concat!("cj-import/", env!("CARGO_PKG_VERSION"));

/// Remote call errors
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    Network(String),

    /// Backend answered with a non-success status; `message` is its `error` field
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Not authenticated")]
    NotAuthenticated,
}

/// Remote operations the import pipeline depends on
///
/// Implementations must honor two contracts:
/// - `bulk_import_journalists` is idempotent on email: a row whose email
///   already exists is reported in `skipped`/`skippedRows`, never inserted twice.
/// - `process_image_batch` reports every submitted profile id in exactly one of
///   `successful` / `failed`.
#[async_trait]
pub trait JournalistAdmin: Send + Sync {
    /// Create journalist profiles for one batch of rows
    async fn bulk_import_journalists(
        &self,
        rows: &[JournalistRow],
    ) -> Result<BulkImportResult, RemoteError>;

    /// Fetch and store email screenshots for one batch of profiles
    async fn process_image_batch(
        &self,
        items: &[PendingImage],
    ) -> Result<ImageBatchResult, RemoteError>;
}

#[derive(Serialize)]
struct AdminRequest<'a, T: Serialize> {
    action: &'a str,
    data: T,
}

#[derive(Deserialize)]
struct AdminErrorBody {
    error: Option<String>,
}

/// HTTP client for the hosted admin backend
pub struct HttpAdminClient {
    http_client: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
}

impl HttpAdminClient {
    /// Create client for `api_url` (the project base URL)
    ///
    /// `timeout` of `None` waits for the backend indefinitely.
    pub fn new(
        api_url: &str,
        access_token: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, RemoteError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: format!("{}{}", api_url.trim_end_matches('/'), FUNCTION_PATH),
            access_token,
        })
    }

    /// Full URL of the admin function
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<D, T>(&self, action: &str, data: D) -> Result<T, RemoteError>
    where
        D: Serialize + Send,
        T: DeserializeOwned,
    {
        let token = self
            .access_token
            .as_deref()
            .ok_or(RemoteError::NotAuthenticated)?;

        tracing::debug!(action = %action, endpoint = %self.endpoint, "Calling admin function");

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&AdminRequest { action, data })
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<AdminErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| "Admin operation failed".to_string());
            return Err(RemoteError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

#[async_trait]
impl JournalistAdmin for HttpAdminClient {
    async fn bulk_import_journalists(
        &self,
        rows: &[JournalistRow],
    ) -> Result<BulkImportResult, RemoteError> {
        self.call("bulk_import", rows).await
    }

    async fn process_image_batch(
        &self,
        items: &[PendingImage],
    ) -> Result<ImageBatchResult, RemoteError> {
        self.call("process_images", items).await
    }
}

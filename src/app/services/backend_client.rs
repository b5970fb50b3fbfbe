//! HTTP client for the conversion/storage backend.
//!
//! The backend converts binary `.rld` logger files to text, parses and stores
//! processed data, and lists stored files. This client is a thin wrapper: it
//! never retries, and every transport or non-2xx failure surfaces as a
//! [`BackendError`].
//!
//! # Example
//!
//! ```no_run
//! use datasense::app::services::backend_client::BackendClient;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = BackendClient::new("http://localhost:8000", Duration::from_secs(30))?;
//!
//! let health = client.health().await?;
//! println!("Backend status: {}", health.status);
//!
//! for file in client.list_files().await? {
//!     println!("{} ({} records)", file.filename, file.records_added);
//! }
//! # Ok(())
//! # }
//! ```

use reqwest::{Client, Url};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::Config;
use crate::app::models::{DatasetSummary, SensorReading};
use crate::constants::routes;

/// HTTP client for the backend API
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

/// Transport and service failures
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The backend could not be reached
    #[error("Backend not reachable at {url}: {source}")]
    NotReachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The request timed out; transient, re-probed by the health check
    #[error("Backend request to {url} timed out")]
    Timeout { url: String },

    /// HTTP request or response decoding failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Non-2xx response
    #[error("Backend error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl BackendError {
    /// Whether a later attempt might succeed without user action
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BackendError::Timeout { .. } | BackendError::NotReachable { .. }
        )
    }
}

/// Result type for backend client operations
pub type Result<T> = std::result::Result<T, BackendError>;

// ==========================================================================
// Response Types
// ==========================================================================

/// `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy") || self.status.eq_ignore_ascii_case("ok")
    }
}

/// `GET /api/data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentDataResponse {
    #[serde(default)]
    pub data: Vec<SensorReading>,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Metadata of a file stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendFile {
    pub filename: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub records_added: usize,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub processing_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// `GET /api/files`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilesResponse {
    #[serde(default)]
    pub files: Vec<BackendFile>,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Upload-and-process responses (`/api/process-rld`, `/api/process-txt`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub records_added: usize,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub summary: Option<DatasetSummary>,
    #[serde(default)]
    pub data: Option<Vec<SensorReading>>,
}

/// `POST /api/convert-rld-to-txt`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResponse {
    pub txt_content: String,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Backend availability as seen by the health probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    Connecting,
    Online,
    Offline { reason: String },
}

impl BackendStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, BackendStatus::Online)
    }
}

// ==========================================================================
// BackendClient Implementation
// ==========================================================================

impl BackendClient {
    /// Create a new client
    ///
    /// `base_url` must start with `http://` or `https://`; a trailing slash
    /// is removed.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(BackendError::Request)?;
        Self::with_client(base_url, client)
    }

    /// Create a client with a custom reqwest Client
    pub fn with_client(base_url: &str, client: Client) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(BackendError::InvalidUrl(format!(
                "URL must start with http:// or https://, got: {}",
                base_url
            )));
        }

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.backend.base_url, config.backend.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check whether the backend answers its health endpoint
    pub async fn is_reachable(&self) -> bool {
        self.health().await.is_ok()
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        self.get(&self.url(routes::HEALTH)).await
    }

    /// Fetch the dataset currently stored by the backend
    pub async fn fetch_current_data(&self) -> Result<Vec<SensorReading>> {
        let response: CurrentDataResponse = self.get(&self.url(routes::DATA)).await?;
        debug!("Fetched {} readings from backend", response.data.len());
        Ok(response.data)
    }

    pub async fn list_files(&self) -> Result<Vec<BackendFile>> {
        let response: FilesResponse = self.get(&self.url(routes::FILES)).await?;
        Ok(response.files)
    }

    /// Upload a binary logger file for conversion, parsing and storage
    pub async fn upload_and_process(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<ProcessResponse> {
        info!("Uploading {} for processing", file_name);
        self.post_file(&self.url(routes::PROCESS_RLD), file_name, contents)
            .await
    }

    /// Upload a text export for server-side parsing and storage
    pub async fn process_text(&self, file_name: &str, contents: Vec<u8>) -> Result<ProcessResponse> {
        info!("Uploading {} for text processing", file_name);
        self.post_file(&self.url(routes::PROCESS_TXT), file_name, contents)
            .await
    }

    /// Convert a binary logger file to text and return the text content
    pub async fn convert_binary_to_text(&self, file_name: &str, contents: Vec<u8>) -> Result<String> {
        info!("Converting {} to text", file_name);
        let response: ConversionResponse = self
            .post_file(&self.url(routes::CONVERT_RLD_TO_TXT), file_name, contents)
            .await?;
        Ok(response.txt_content)
    }

    /// Delete a stored file by name
    ///
    /// The name is sent as one percent-encoded path segment.
    pub async fn delete_file(&self, file_name: &str) -> Result<()> {
        let mut url = Url::parse(&self.url(routes::FILES))
            .map_err(|e| BackendError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(format!("{} cannot carry a path", self.base_url)))?
            .push(file_name);
        self.delete(url.as_str()).await
    }

    // ======================================================================
    // Internal HTTP helpers
    // ======================================================================

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    fn transport_error(url: &str, error: reqwest::Error) -> BackendError {
        if error.is_timeout() {
            BackendError::Timeout {
                url: url.to_string(),
            }
        } else {
            BackendError::NotReachable {
                url: url.to_string(),
                source: error,
            }
        }
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::transport_error(url, e))?;

        self.handle_response(response).await
    }

    async fn post_file<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<T> {
        let part = Part::bytes(contents).file_name(file_name.to_string());
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Self::transport_error(url, e))?;

        self.handle_response(response).await
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|e| Self::transport_error(url, e))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::api_error(response).await)
        }
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if response.status().is_success() {
            response.json().await.map_err(BackendError::Request)
        } else {
            Err(Self::api_error(response).await)
        }
    }

    /// Build an API error, preferring the body's `error` or `detail` message
    async fn api_error(response: reqwest::Response) -> BackendError {
        let status = response.status();
        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| {
                ["error", "detail"]
                    .iter()
                    .find_map(|field| v.get(field).and_then(|e| e.as_str()).map(String::from))
            })
            .unwrap_or_else(|| status.to_string());

        BackendError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

// ==========================================================================
// Health Probe
// ==========================================================================

const MIN_HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Spawn a task that probes backend health on a fixed interval
///
/// The current status is published on the returned watch channel, starting
/// at [`BackendStatus::Connecting`]. The task ends once every receiver has
/// been dropped. Intervals shorter than one second are raised to one second.
pub fn spawn_health_probe(
    client: BackendClient,
    interval: Duration,
) -> (watch::Receiver<BackendStatus>, JoinHandle<()>) {
    let (tx, rx) = watch::channel(BackendStatus::Connecting);

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval.max(MIN_HEALTH_CHECK_INTERVAL));
        loop {
            ticker.tick().await;

            let status = match client.health().await {
                Ok(_) => BackendStatus::Online,
                Err(e) => {
                    if e.is_transient() {
                        debug!("Backend health probe failed: {}", e);
                    } else {
                        warn!("Backend health probe failed: {}", e);
                    }
                    BackendStatus::Offline {
                        reason: e.to_string(),
                    }
                }
            };

            let changed = *tx.borrow() != status;
            if changed {
                info!("Backend status changed: {:?}", status);
            }
            if tx.send(status).is_err() {
                debug!("No health status subscribers left, stopping probe");
                break;
            }
        }
    });

    (rx, handle)
}

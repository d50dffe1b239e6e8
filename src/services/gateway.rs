// API Gateway Client
// REST client for the StreamVault ingestion server

use crate::models::{ActivityKind, IngestStats, Quality, Stream, StreamStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:3001";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Failure talking to the ingestion server
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request never completed or the body could not be decoded
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered outside the 2xx range
    #[error("API Error: {status} {status_text}")]
    Status { status: u16, status_text: String },
}

impl GatewayError {
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        GatewayError::Status {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }

    /// HTTP status when the server answered, `None` when it never did
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Status { status, .. } => Some(*status),
            GatewayError::Request(_) => None,
        }
    }
}

/// Reachability of the server after the most recent request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// No request has completed yet
    #[default]
    Unknown,
    Connected,
    Disconnected,
}

/// Stream record as the server reports it. Older servers omit some fields
/// the console tracks; [`ApiStream::into_stream`] fills those in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStream {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    pub platform: String,
    pub status: StreamStatus,
    pub current_quality: Quality,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub output_folder: Option<String>,
    #[serde(default)]
    pub final_mp4_path: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl ApiStream {
    /// Normalize a wire record into the local model
    pub fn into_stream(self) -> Stream {
        let title = self.title.unwrap_or_else(|| self.platform.clone());
        let output_folder = self
            .output_folder
            .unwrap_or_else(|| format!("/streams/{}", self.id));

        Stream {
            id: self.id,
            url: self.url,
            title,
            platform: self.platform,
            status: self.status,
            current_quality: self.current_quality,
            start_time: self.start_time,
            end_time: self.end_time,
            output_folder,
            final_mp4_path: self.final_mp4_path,
            error_message: self.error_message,
        }
    }
}

/// Activity entry as the server reports it; `time` is a display string,
/// not a timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiActivity {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub time: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartStreamRequest<'a> {
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_id: Option<&'a str>,
}

/// Server acknowledgement for a start request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartStreamResponse {
    pub message: String,
    pub stream_id: String,
}

/// Server acknowledgement for a stop request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopStreamResponse {
    pub message: String,
}

/// Operations the console needs from an ingestion server. [`HttpGateway`]
/// talks to a real server; the simulated backend implements the same trait
/// for offline runs.
#[async_trait]
pub trait IngestGateway: Send + Sync {
    /// Whether the server answers its health probe
    async fn health_check(&self) -> bool;

    /// Every stream the server knows about
    async fn list_streams(&self) -> Result<Vec<ApiStream>, GatewayError>;

    /// A single stream by id
    async fn get_stream(&self, id: &str) -> Result<ApiStream, GatewayError>;

    /// Ask the server to begin ingesting a source
    async fn start_stream(
        &self,
        url: &str,
        custom_id: Option<&str>,
    ) -> Result<StartStreamResponse, GatewayError>;

    /// Ask the server to stop a running ingestion
    async fn stop_stream(&self, id: &str) -> Result<StopStreamResponse, GatewayError>;

    /// Aggregate counters for the dashboard
    async fn get_stats(&self) -> Result<IngestStats, GatewayError>;

    /// Server-side activity feed. Servers without the endpoint yield an
    /// empty feed rather than an error.
    async fn get_activity(&self) -> Vec<ApiActivity>;

    /// Browser-ready URL for a finished download
    fn download_url(&self, id: &str) -> String;

    /// Reachability recorded by the most recent request
    fn connection_status(&self) -> ConnectionStatus;
}

/// REST client for the ingestion server
pub struct HttpGateway {
    client: Client,
    base_url: String,
    connection: RwLock<ConnectionStatus>,
}

impl HttpGateway {
    /// Create a client against the default server URL
    pub fn new() -> Self {
        Self::with_url(DEFAULT_API_URL.to_string())
    }

    /// Create a client against a custom server URL
    pub fn with_url(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            connection: RwLock::new(ConnectionStatus::Unknown),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn set_connection(&self, status: ConnectionStatus) {
        let mut connection = self.connection.write().unwrap_or_else(|e| e.into_inner());
        *connection = status;
    }

    /// Send a request, recording whether the server was reachable
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, GatewayError> {
        match request.send().await {
            Ok(response) => {
                self.set_connection(ConnectionStatus::Connected);
                Ok(response)
            }
            Err(e) => {
                self.set_connection(ConnectionStatus::Disconnected);
                Err(e.into())
            }
        }
    }
}

impl Default for HttpGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IngestGateway for HttpGateway {
    async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url);

        match self.send(self.client.get(&url)).await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn list_streams(&self) -> Result<Vec<ApiStream>, GatewayError> {
        let url = format!("{}/streams", self.base_url);

        let response = self.send(self.client.get(&url)).await?;
        if !response.status().is_success() {
            return Err(GatewayError::from_status(response.status()));
        }

        Ok(response.json().await?)
    }

    async fn get_stream(&self, id: &str) -> Result<ApiStream, GatewayError> {
        let url = format!("{}/streams/{}", self.base_url, urlencoding::encode(id));

        let response = self.send(self.client.get(&url)).await?;
        if !response.status().is_success() {
            return Err(GatewayError::from_status(response.status()));
        }

        Ok(response.json().await?)
    }

    async fn start_stream(
        &self,
        url: &str,
        custom_id: Option<&str>,
    ) -> Result<StartStreamResponse, GatewayError> {
        let endpoint = format!("{}/streams/start", self.base_url);
        let body = StartStreamRequest { url, custom_id };

        let response = self.send(self.client.post(&endpoint).json(&body)).await?;
        if !response.status().is_success() {
            return Err(GatewayError::from_status(response.status()));
        }

        Ok(response.json().await?)
    }

    async fn stop_stream(&self, id: &str) -> Result<StopStreamResponse, GatewayError> {
        let url = format!(
            "{}/streams/{}/stop",
            self.base_url,
            urlencoding::encode(id)
        );

        let response = self.send(self.client.post(&url)).await?;
        if !response.status().is_success() {
            return Err(GatewayError::from_status(response.status()));
        }

        Ok(response.json().await?)
    }

    async fn get_stats(&self) -> Result<IngestStats, GatewayError> {
        let url = format!("{}/stats", self.base_url);

        let response = self.send(self.client.get(&url)).await?;
        if !response.status().is_success() {
            return Err(GatewayError::from_status(response.status()));
        }

        Ok(response.json().await?)
    }

    async fn get_activity(&self) -> Vec<ApiActivity> {
        let url = format!("{}/activity", self.base_url);

        let response = match self.send(self.client.get(&url)).await {
            Ok(response) => response,
            Err(_) => return Vec::new(),
        };
        if !response.status().is_success() {
            return Vec::new();
        }

        response.json().await.unwrap_or_default()
    }

    fn download_url(&self, id: &str) -> String {
        format!(
            "{}/streams/{}/download",
            self.base_url,
            urlencoding::encode(id)
        )
    }

    fn connection_status(&self) -> ConnectionStatus {
        *self.connection.read().unwrap_or_else(|e| e.into_inner())
    }
}

/// Display label for a source URL: the host with any leading `www.` removed
pub fn platform_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .host_str()
                .map(|host| host.trim_start_matches("www.").to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

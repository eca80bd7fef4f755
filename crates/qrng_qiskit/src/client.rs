//! IBM Quantum REST API client
//!
//! Thin `reqwest` wrapper: auth and version headers, status-code mapping,
//! retry on rate limits, and the backend discovery endpoints.

use crate::auth::{AuthError, IbmCredentials};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// API version pinned in every request
pub const API_VERSION: &str = "2025-01-01";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const UNAVAILABLE_BACKOFF: Duration = Duration::from_secs(5);
const DEFAULT_RETRY_AFTER: u64 = 60;

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Authentication error
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// 401 from the service
    #[error("Unauthorized: invalid or expired token")]
    Unauthorized,

    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// API error response
    #[error("API error ({code}): {message}")]
    ApiError {
        /// HTTP status code
        code: u16,
        /// Response body
        message: String,
    },

    /// JSON parsing error
    #[error("Failed to parse response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Response body had none of the known shapes
    #[error("Unrecognized response format: {0}")]
    UnknownFormat(String),

    /// Backend not found
    #[error("Backend not found: {0}")]
    BackendNotFound(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after}s")]
    RateLimited {
        /// Seconds to wait before retry
        retry_after: u64,
    },

    /// Service unavailable
    #[error("Service temporarily unavailable")]
    ServiceUnavailable,
}

impl ClientError {
    /// Map a non-success HTTP status to an error
    pub fn from_status(code: u16, retry_after: Option<u64>, body: String) -> Self {
        match code {
            401 => ClientError::Unauthorized,
            429 => ClientError::RateLimited {
                retry_after: retry_after.unwrap_or(DEFAULT_RETRY_AFTER),
            },
            503 => ClientError::ServiceUnavailable,
            _ => ClientError::ApiError {
                code,
                message: body,
            },
        }
    }

    /// Whether waiting and retrying can help
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClientError::RateLimited { .. } | ClientError::ServiceUnavailable
        )
    }
}

/// IBM Quantum API client
#[derive(Clone)]
pub struct IbmClient {
    client: reqwest::Client,
    credentials: IbmCredentials,
    base_url: String,
}

impl IbmClient {
    /// Build a client without contacting the service
    pub fn new(credentials: IbmCredentials) -> Result<Self, ClientError> {
        credentials.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("qrng/", env!("CARGO_PKG_VERSION"), " (Rust)")),
        );
        headers.insert(
            HeaderName::from_static("ibm-api-version"),
            HeaderValue::from_static(API_VERSION),
        );
        if let Some(crn) = credentials.service_crn() {
            headers.insert(
                HeaderName::from_static("service-crn"),
                HeaderValue::from_str(crn).map_err(|_| AuthError::InvalidTokenFormat)?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: credentials.channel().api_url(),
            client,
            credentials,
        })
    }

    /// Authenticate once (IAM exchange for API keys), resolve an instance
    /// name to its CRN, then build the client
    pub async fn connect(credentials: IbmCredentials) -> Result<Self, ClientError> {
        credentials.validate()?;
        let credentials = credentials.resolve_instance().await?;
        let client = Self::new(credentials)?;
        client.credentials.auth_header().await?;
        log::info!(
            "Connected to IBM Quantum ({}, {})",
            client.credentials.channel(),
            client.base_url
        );
        Ok(client)
    }

    /// Override the API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    // ========================================================================
    // Low-level HTTP methods
    // ========================================================================

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ClientError> {
        let auth = self.credentials.auth_header().await?;
        let response = request.header(AUTHORIZATION, auth).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.text().await?);
        }

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok());
        let body = response.text().await.unwrap_or_default();
        log::debug!("HTTP {}: {}", status, body);
        Err(ClientError::from_status(status.as_u16(), retry_after, body))
    }

    /// GET request returning the raw body
    pub async fn get_text(&self, path: &str) -> Result<String, ClientError> {
        self.send(self.client.get(self.url(path))).await
    }

    /// GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let body = self.get_text(path).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// POST request
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let text = self.send(self.client.post(self.url(path)).json(body)).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn backoff(err: &ClientError) {
        let wait = match err {
            ClientError::RateLimited { retry_after } => Duration::from_secs(*retry_after),
            _ => UNAVAILABLE_BACKOFF,
        };
        log::warn!("{}; retrying in {}s", err, wait.as_secs());
        tokio::time::sleep(wait).await;
    }

    /// GET request, retrying transient failures
    pub async fn get_with_retry<T: DeserializeOwned>(
        &self,
        path: &str,
        max_retries: usize,
    ) -> Result<T, ClientError> {
        let mut retries = 0;
        loop {
            match self.get(path).await {
                Err(e) if e.is_transient() && retries < max_retries => {
                    retries += 1;
                    Self::backoff(&e).await;
                }
                other => return other,
            }
        }
    }

    /// POST request, retrying transient failures
    pub async fn post_with_retry<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        max_retries: usize,
    ) -> Result<T, ClientError> {
        let mut retries = 0;
        loop {
            match self.post(path, body).await {
                Err(e) if e.is_transient() && retries < max_retries => {
                    retries += 1;
                    Self::backoff(&e).await;
                }
                other => return other,
            }
        }
    }

    // ========================================================================
    // Backend APIs
    // ========================================================================

    /// List available backends
    pub async fn list_backends(&self) -> Result<Vec<BackendInfo>, ClientError> {
        let body = self.get_text("/backends").await?;
        parse_backend_list(&body)
    }

    /// Get backend status
    pub async fn get_backend_status(&self, name: &str) -> Result<BackendStatus, ClientError> {
        let path = format!("/backends/{}/status", name);
        match self.get(&path).await {
            Err(ClientError::ApiError { code: 404, .. }) => {
                Err(ClientError::BackendNotFound(name.to_string()))
            }
            other => other,
        }
    }

    /// Get backend configuration (qubit count, shot limit)
    pub async fn get_backend_config(&self, name: &str) -> Result<BackendConfig, ClientError> {
        let path = format!("/backends/{}/configuration", name);
        match self.get(&path).await {
            Err(ClientError::ApiError { code: 404, .. }) => {
                Err(ClientError::BackendNotFound(name.to_string()))
            }
            other => other,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Get credentials
    pub fn credentials(&self) -> &IbmCredentials {
        &self.credentials
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Parse a backend list body.
///
/// Accepts `{"devices": [...]}`, `{"backends": [...]}` and a bare array.
pub fn parse_backend_list(body: &str) -> Result<Vec<BackendInfo>, ClientError> {
    if let Ok(response) = serde_json::from_str::<DevicesResponse>(body) {
        return Ok(response.devices.into_iter().map(BackendInfo::from).collect());
    }
    if let Ok(response) = serde_json::from_str::<BackendsResponse>(body) {
        return Ok(response.backends);
    }
    if let Ok(backends) = serde_json::from_str::<Vec<BackendInfo>>(body) {
        return Ok(backends);
    }

    let preview: String = body.chars().take(200).collect();
    Err(ClientError::UnknownFormat(preview))
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
struct BackendsResponse {
    backends: Vec<BackendInfo>,
}

#[derive(Debug, Clone, Deserialize)]
struct DevicesResponse {
    devices: Vec<DeviceInfo>,
}

/// Device entry of the 2025 `{"devices": [...]}` listing
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceInfo {
    /// Backend name
    pub name: String,

    /// Number of qubits
    #[serde(default)]
    pub qubits: usize,

    /// Queue length
    #[serde(default)]
    pub queue_length: u64,

    /// Status, e.g. `{"name": "online"}`
    pub status: Option<DeviceStatus>,

    /// Processor family and revision
    pub processor_type: Option<ProcessorType>,
}

/// Device status (2025 API)
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceStatus {
    /// Status name (e.g. "online", "offline")
    pub name: Option<String>,
    /// Status reason
    pub reason: Option<String>,
}

impl From<DeviceInfo> for BackendInfo {
    fn from(device: DeviceInfo) -> Self {
        let operational = device
            .status
            .as_ref()
            .and_then(|s| s.name.as_deref())
            .map(|n| n.eq_ignore_ascii_case("online"))
            .unwrap_or(false);

        BackendInfo {
            name: device.name,
            num_qubits: Some(device.qubits),
            simulator: false,
            processor_type: device.processor_type,
            operational,
            queue_length: Some(device.queue_length),
        }
    }
}

/// Backend information (unified across listing formats)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendInfo {
    /// Backend name
    #[serde(alias = "backend_name")]
    pub name: String,

    /// Number of qubits
    #[serde(rename = "n_qubits", alias = "num_qubits", alias = "qubits", default)]
    pub num_qubits: Option<usize>,

    /// Whether backend is simulator
    #[serde(default)]
    pub simulator: bool,

    /// Processor type
    #[serde(default)]
    pub processor_type: Option<ProcessorType>,

    /// Whether backend is operational
    #[serde(default)]
    pub operational: bool,

    /// Queue length
    #[serde(default, alias = "pending_jobs")]
    pub queue_length: Option<u64>,
}

/// Processor type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorType {
    /// Family (e.g. "Eagle", "Heron")
    pub family: Option<String>,

    /// Revision
    pub revision: Option<String>,
}

/// Backend status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendStatus {
    /// Backend name
    pub backend_name: Option<String>,

    /// Operational status
    #[serde(default)]
    pub operational: bool,

    /// Pending jobs
    pub pending_jobs: Option<u64>,

    /// Status message
    pub status_msg: Option<String>,
}

impl BackendStatus {
    /// Operational and not reporting maintenance
    pub fn is_available(&self) -> bool {
        self.operational
            && !self
                .status_msg
                .as_deref()
                .map(|m| m.to_lowercase().contains("maintenance"))
                .unwrap_or(false)
    }
}

/// Backend configuration (subset used for job sizing)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend name
    pub backend_name: Option<String>,

    /// Number of qubits
    pub n_qubits: Option<usize>,

    /// Basis gates
    #[serde(default)]
    pub basis_gates: Vec<String>,

    /// Max shots per job
    pub max_shots: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_devices_format() {
        let body = r#"{"devices": [
            {"name": "ibm_sherbrooke", "qubits": 127, "queue_length": 12,
             "status": {"name": "online"}, "processor_type": {"family": "Eagle", "revision": "3"}},
            {"name": "ibm_kyiv", "qubits": 127, "status": {"name": "offline", "reason": "calibration"}}
        ]}"#;

        let backends = parse_backend_list(body).unwrap();
        assert_eq!(backends.len(), 2);
        assert_eq!(backends[0].name, "ibm_sherbrooke");
        assert!(backends[0].operational);
        assert_eq!(backends[0].queue_length, Some(12));
        assert!(!backends[1].operational);
    }

    #[test]
    fn test_parse_legacy_format() {
        let body = r#"{"backends": [{"name": "ibm_brisbane", "n_qubits": 127, "operational": true}]}"#;

        let backends = parse_backend_list(body).unwrap();
        assert_eq!(backends[0].num_qubits, Some(127));
        assert!(backends[0].operational);
    }

    #[test]
    fn test_parse_bare_array() {
        let body = r#"[{"backend_name": "ibm_torino", "num_qubits": 133}]"#;

        let backends = parse_backend_list(body).unwrap();
        assert_eq!(backends[0].name, "ibm_torino");
        assert!(!backends[0].operational);
    }

    #[test]
    fn test_parse_unknown_format() {
        assert!(matches!(
            parse_backend_list(r#"{"items": 3}"#),
            Err(ClientError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_backend_status() {
        let json = r#"{"backend_name": "ibm_sherbrooke", "operational": true,
                       "pending_jobs": 42, "status_msg": "active"}"#;
        let status: BackendStatus = serde_json::from_str(json).unwrap();
        assert!(status.is_available());
        assert_eq!(status.pending_jobs, Some(42));

        let json = r#"{"operational": true, "status_msg": "Maintenance"}"#;
        let status: BackendStatus = serde_json::from_str(json).unwrap();
        assert!(!status.is_available());
    }

    #[test]
    fn test_backend_config() {
        let json = r#"{"backend_name": "ibm_sherbrooke", "n_qubits": 127,
                       "basis_gates": ["ecr", "id", "rz", "sx", "x"], "max_shots": 100000,
                       "coupling_map": [[0, 1]]}"#;
        let config: BackendConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.n_qubits, Some(127));
        assert!(config.basis_gates.iter().any(|g| g == "sx"));
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            ClientError::from_status(401, None, String::new()),
            ClientError::Unauthorized
        ));
        assert!(matches!(
            ClientError::from_status(429, Some(7), String::new()),
            ClientError::RateLimited { retry_after: 7 }
        ));
        assert!(matches!(
            ClientError::from_status(429, None, String::new()),
            ClientError::RateLimited { retry_after: 60 }
        ));
        assert!(ClientError::from_status(503, None, String::new()).is_transient());

        let err = ClientError::from_status(404, None, "no such job".into());
        assert!(!err.is_transient());
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_client_headers_reject_bad_crn() {
        let creds = crate::auth::IbmCredentials::new("a".repeat(44)).with_crn("bad\ncrn");
        assert!(IbmClient::new(creds).is_err());
    }

    #[test]
    fn test_with_base_url() {
        let creds = crate::auth::IbmCredentials::new("a".repeat(44));
        let client = IbmClient::new(creds).unwrap().with_base_url("http://localhost:8080/api/");
        assert_eq!(client.base_url(), "http://localhost:8080/api");
    }
}

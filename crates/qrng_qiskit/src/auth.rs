//! IBM Quantum authentication
//!
//! Credential sources, in priority order:
//! 1. Environment: `IBM_API_KEY`, then `IBM_QUANTUM_TOKEN`, `IBMQ_TOKEN`,
//!    `QISKIT_IBM_TOKEN`, `IBM_CLOUD_API_KEY`
//! 2. Qiskit config file (`~/.qiskit/qiskit-ibm.json`)
//!
//! IBM Cloud API keys are exchanged for an IAM bearer token; platform
//! tokens are sent as bearer tokens directly.

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credential found in any source
    #[error("IBM_API_KEY not found: set it in the environment or .env, or save credentials with Qiskit")]
    MissingToken,

    /// Token present but malformed
    #[error("Invalid API token format")]
    InvalidTokenFormat,

    /// Config file read error
    #[error("Failed to read Qiskit config file: {0}")]
    ConfigFileError(String),

    /// Config file parse error
    #[error("Failed to parse Qiskit config file: {0}")]
    ConfigParseError(String),

    /// IAM token exchange error
    #[error("IAM token exchange failed: {0}")]
    IamTokenExchangeFailed(String),

    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Instance name has no matching Qiskit Runtime instance
    #[error("No IBM Quantum instance named '{0}' in this account")]
    InstanceNotFound(String),

    /// Global Search request or response unusable
    #[error("Instance lookup failed: {0}")]
    InstanceLookupFailed(String),
}

/// Environment variables checked for a credential, in order
pub const TOKEN_ENV_VARS: [&str; 5] = [
    "IBM_API_KEY",
    "IBM_QUANTUM_TOKEN",
    "IBMQ_TOKEN",
    "QISKIT_IBM_TOKEN",
    "IBM_CLOUD_API_KEY",
];

/// IAM token endpoint
const IAM_TOKEN_URL: &str = "https://iam.cloud.ibm.com/identity/token";

/// Refresh cached IAM tokens this long before they expire
const IAM_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// IBM Cloud Global Search, used to find an instance CRN by name
const GLOBAL_SEARCH_URL: &str = "https://api.global-search-tagging.cloud.ibm.com/v3/resources/search";

/// Resource-catalog service name of Qiskit Runtime instances
const QUANTUM_SERVICE_NAME: &str = "quantum-computing";

/// Qiskit config file entry (`~/.qiskit/qiskit-ibm.json`)
#[derive(Debug, Clone, Deserialize)]
struct QiskitConfigEntry {
    token: String,

    #[serde(default)]
    channel: Option<String>,

    #[serde(default)]
    url: Option<String>,

    #[serde(default)]
    instance: Option<String>,
}

/// Type of API token/key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    /// Platform token, used as bearer directly
    IqpToken,
    /// IBM Cloud API key, exchanged at IAM first
    ApiKey,
}

impl TokenType {
    /// Detect token type from its prefix
    pub fn detect(token: &str) -> Self {
        if token.starts_with("ApiKey-") || token.starts_with("apikey-") {
            TokenType::ApiKey
        } else {
            TokenType::IqpToken
        }
    }
}

/// IBM Quantum channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IbmChannel {
    /// IBM Quantum Platform
    #[default]
    IbmQuantum,

    /// IBM Cloud
    IbmCloud,
}

impl IbmChannel {
    /// Parse a channel name such as `ibm_cloud` or `ibm_quantum_platform`
    pub fn parse(name: &str) -> Self {
        if name.to_lowercase().contains("cloud") {
            IbmChannel::IbmCloud
        } else {
            IbmChannel::IbmQuantum
        }
    }

    /// Base URL (both channels share the unified 2025 endpoint)
    pub fn base_url(&self) -> &'static str {
        "https://quantum.cloud.ibm.com"
    }

    /// API URL with the `/api/v1` prefix
    pub fn api_url(&self) -> String {
        format!("{}/api/v1", self.base_url())
    }
}

impl fmt::Display for IbmChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IbmChannel::IbmQuantum => write!(f, "ibm_quantum_platform"),
            IbmChannel::IbmCloud => write!(f, "ibm_cloud"),
        }
    }
}

/// Where a credential was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Passed in directly
    Explicit,
    /// Named environment variable
    Env(&'static str),
    /// Named entry of the Qiskit config file
    QiskitConfig(String),
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Explicit => write!(f, "explicit"),
            CredentialSource::Env(var) => write!(f, "${}", var),
            CredentialSource::QiskitConfig(name) => write!(f, "qiskit-ibm.json [{}]", name),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct IamTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Clone, Deserialize)]
struct SearchItem {
    crn: String,
    #[serde(default)]
    name: Option<String>,
}

/// Whether `value` is a Cloud Resource Name
pub fn is_crn(value: &str) -> bool {
    value.starts_with("crn:")
}

/// Global Search query for the Qiskit Runtime instance called `name`
pub fn instance_search_query(name: &str) -> String {
    format!(
        "service_name:{} AND name:\"{}\"",
        QUANTUM_SERVICE_NAME,
        name.replace('"', "\\\"")
    )
}

/// CRN of the instance called `name` in a Global Search response body
pub fn parse_instance_search(body: &str, name: &str) -> Result<Option<String>, AuthError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| AuthError::InstanceLookupFailed(e.to_string()))?;

    Ok(response
        .items
        .into_iter()
        .filter(|item| is_crn(&item.crn))
        .find(|item| item.name.as_deref().map_or(true, |n| n == name))
        .map(|item| item.crn))
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// IBM Quantum credentials
#[derive(Debug, Clone)]
pub struct IbmCredentials {
    api_token: String,
    token_type: TokenType,
    instance: Option<String>,
    channel: IbmChannel,
    service_crn: Option<String>,
    source: CredentialSource,
    cached_iam_token: Arc<RwLock<Option<CachedToken>>>,
}

impl IbmCredentials {
    /// Create credentials from a token or API key
    pub fn new(api_token: impl Into<String>) -> Self {
        let token = api_token.into();
        let token_type = TokenType::detect(&token);
        Self {
            api_token: token,
            token_type,
            instance: None,
            channel: IbmChannel::default(),
            service_crn: None,
            source: CredentialSource::Explicit,
            cached_iam_token: Arc::new(RwLock::new(None)),
        }
    }

    /// Load from the process environment
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load from an arbitrary variable lookup
    ///
    /// `IBM_API_KEY` is an IBM Cloud API key: it selects the cloud channel
    /// and IAM exchange regardless of its prefix.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (var, token) = TOKEN_ENV_VARS
            .iter()
            .find_map(|&var| {
                lookup(var)
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .map(|v| (var, v))
            })
            .ok_or(AuthError::MissingToken)?;

        let mut creds = Self::new(token);
        creds.source = CredentialSource::Env(var);

        if var == "IBM_API_KEY" || var == "IBM_CLOUD_API_KEY" {
            creds.token_type = TokenType::ApiKey;
            creds.channel = IbmChannel::IbmCloud;
        }
        if let Some(channel) = lookup("IBM_QUANTUM_CHANNEL") {
            creds.channel = IbmChannel::parse(&channel);
        }
        creds.instance = lookup("IBM_QUANTUM_INSTANCE");
        creds.service_crn = lookup("IBM_QUANTUM_CRN").or_else(|| lookup("SERVICE_CRN"));

        Ok(creds)
    }

    fn qiskit_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".qiskit").join("qiskit-ibm.json"))
    }

    /// Load from the Qiskit config file.
    ///
    /// `name` selects a named entry; otherwise an entry whose name starts
    /// with `default` wins, else the first one.
    pub fn from_qiskit_config(name: Option<&str>) -> Result<Self, AuthError> {
        let config_path = Self::qiskit_config_path().ok_or_else(|| {
            AuthError::ConfigFileError("Could not determine home directory".into())
        })?;

        if !config_path.exists() {
            return Err(AuthError::ConfigFileError(format!(
                "not found: {}",
                config_path.display()
            )));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| AuthError::ConfigFileError(format!("{}: {}", config_path.display(), e)))?;

        Self::from_qiskit_json(&content, name)
    }

    fn from_qiskit_json(content: &str, name: Option<&str>) -> Result<Self, AuthError> {
        let config: HashMap<String, QiskitConfigEntry> = serde_json::from_str(content)
            .map_err(|e| AuthError::ConfigParseError(e.to_string()))?;

        let (entry_name, entry) = match name {
            Some(requested) => config.get_key_value(requested).ok_or_else(|| {
                AuthError::ConfigParseError(format!("Credential '{}' not found", requested))
            })?,
            None => {
                let mut names: Vec<&String> = config.keys().collect();
                names.sort();
                let chosen = names
                    .iter()
                    .find(|k| k.starts_with("default"))
                    .or_else(|| names.first())
                    .ok_or_else(|| AuthError::ConfigParseError("No credentials found".into()))?;
                config.get_key_value(chosen.as_str()).ok_or_else(|| {
                    AuthError::ConfigParseError("No credentials found".into())
                })?
            }
        };

        let mut creds = Self::new(entry.token.clone());
        creds.channel = Self::parse_channel_from_entry(entry);
        creds.instance = entry.instance.clone();
        creds.source = CredentialSource::QiskitConfig(entry_name.clone());
        if creds.channel == IbmChannel::IbmCloud {
            creds.token_type = TokenType::ApiKey;
        }

        Ok(creds)
    }

    fn parse_channel_from_entry(entry: &QiskitConfigEntry) -> IbmChannel {
        if let Some(ref ch) = entry.channel {
            return IbmChannel::parse(ch);
        }
        match entry.url {
            Some(ref url) if url.contains("cloud.ibm.com") => IbmChannel::IbmCloud,
            _ => IbmChannel::IbmQuantum,
        }
    }

    /// Try the environment, then the Qiskit config file
    pub fn auto_load() -> Result<Self, AuthError> {
        match Self::from_env() {
            Ok(creds) => {
                log::info!("Loaded IBM Quantum credentials from {}", creds.source);
                return Ok(creds);
            }
            Err(e) => log::debug!("No credentials in environment: {}", e),
        }

        match Self::from_qiskit_config(None) {
            Ok(creds) => {
                log::info!("Loaded IBM Quantum credentials from {}", creds.source);
                Ok(creds)
            }
            Err(e) => {
                log::debug!("No usable Qiskit config: {}", e);
                Err(AuthError::MissingToken)
            }
        }
    }

    /// Set instance name or CRN
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Set channel
    pub fn with_channel(mut self, channel: IbmChannel) -> Self {
        self.channel = channel;
        self
    }

    /// Set service CRN
    pub fn with_crn(mut self, crn: impl Into<String>) -> Self {
        self.service_crn = Some(crn.into());
        self
    }

    /// Force the token type
    pub fn with_token_type(mut self, token_type: TokenType) -> Self {
        self.token_type = token_type;
        self
    }

    /// Get API token
    pub fn token(&self) -> &str {
        &self.api_token
    }

    /// Get instance
    pub fn instance(&self) -> Option<&str> {
        self.instance.as_deref()
    }

    /// Get channel
    pub fn channel(&self) -> IbmChannel {
        self.channel
    }

    /// Get token type
    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    /// Where the credential came from
    pub fn source(&self) -> &CredentialSource {
        &self.source
    }

    /// Value for the `Service-CRN` header.
    ///
    /// An explicit CRN wins, then an instance given as a CRN. Instance
    /// names yield `None` until [`resolve_instance`](Self::resolve_instance).
    pub fn service_crn(&self) -> Option<&str> {
        self.service_crn
            .as_deref()
            .or_else(|| self.instance.as_deref().filter(|i| is_crn(i)))
    }

    /// Turn an instance name into its CRN through IBM Cloud Global Search.
    ///
    /// No-op when a CRN is already known or no instance is set. Platform
    /// tokens cannot query Global Search; their instance name is left
    /// unresolved.
    pub async fn resolve_instance(mut self) -> Result<Self, AuthError> {
        if self.service_crn().is_some() {
            return Ok(self);
        }
        let Some(name) = self.instance.clone() else {
            return Ok(self);
        };
        if !self.requires_iam_exchange() {
            log::warn!("Cannot resolve instance '{}' without an IBM Cloud API key", name);
            return Ok(self);
        }

        let crn = self.lookup_instance_crn(&name).await?;
        log::info!("Resolved instance {} to {}", name, crn);
        self.service_crn = Some(crn);
        Ok(self)
    }

    async fn lookup_instance_crn(&self, name: &str) -> Result<String, AuthError> {
        let auth = self.auth_header().await?;
        let query = serde_json::json!({
            "query": instance_search_query(name),
            "fields": ["crn", "name"],
        });

        let response = reqwest::Client::new()
            .post(GLOBAL_SEARCH_URL)
            .header("Authorization", auth)
            .header("Accept", "application/json")
            .json(&query)
            .send()
            .await
            .map_err(|e| AuthError::HttpError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::HttpError(e.to_string()))?;
        if !status.is_success() {
            return Err(AuthError::InstanceLookupFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        parse_instance_search(&body, name)?.ok_or_else(|| AuthError::InstanceNotFound(name.to_string()))
    }

    /// Check if this is an API key requiring IAM exchange
    pub fn requires_iam_exchange(&self) -> bool {
        self.token_type == TokenType::ApiKey
    }

    /// Authorization header value, exchanging API keys at IAM when needed
    pub async fn auth_header(&self) -> Result<String, AuthError> {
        match self.token_type {
            TokenType::IqpToken => Ok(format!("Bearer {}", self.api_token)),
            TokenType::ApiKey => {
                let access_token = self.iam_token().await?;
                Ok(format!("Bearer {}", access_token))
            }
        }
    }

    async fn iam_token(&self) -> Result<String, AuthError> {
        {
            let cache = self.cached_iam_token.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Instant::now() + IAM_REFRESH_MARGIN {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        self.exchange_api_key().await
    }

    async fn exchange_api_key(&self) -> Result<String, AuthError> {
        let api_key = self
            .api_token
            .strip_prefix("ApiKey-")
            .or_else(|| self.api_token.strip_prefix("apikey-"))
            .unwrap_or(&self.api_token);

        let params = [
            ("grant_type", "urn:ibm:params:oauth:grant-type:apikey"),
            ("apikey", api_key),
        ];

        let response = reqwest::Client::new()
            .post(IAM_TOKEN_URL)
            .header("Accept", "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::IamTokenExchangeFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let token: IamTokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::IamTokenExchangeFailed(e.to_string()))?;

        *self.cached_iam_token.write().await = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });

        log::info!("IAM token obtained, expires in {}s", token.expires_in);

        Ok(token.access_token)
    }

    /// Basic format check before any network call
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.api_token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        if self.api_token.len() < 20 || self.api_token.chars().any(char::is_whitespace) {
            return Err(AuthError::InvalidTokenFormat);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_ibm_api_key_implies_cloud() {
        let creds = IbmCredentials::from_lookup(lookup(&[("IBM_API_KEY", "abcdefghijklmnopqrstuvwxyz")]))
            .unwrap();

        assert_eq!(creds.token_type(), TokenType::ApiKey);
        assert_eq!(creds.channel(), IbmChannel::IbmCloud);
        assert_eq!(creds.source(), &CredentialSource::Env("IBM_API_KEY"));
    }

    #[test]
    fn test_env_priority() {
        let creds = IbmCredentials::from_lookup(lookup(&[
            ("QISKIT_IBM_TOKEN", "third"),
            ("IBM_QUANTUM_TOKEN", "first"),
        ]))
        .unwrap();

        assert_eq!(creds.token(), "first");
        assert_eq!(creds.token_type(), TokenType::IqpToken);
        assert_eq!(creds.channel(), IbmChannel::IbmQuantum);
    }

    #[test]
    fn test_blank_env_is_missing() {
        let result = IbmCredentials::from_lookup(lookup(&[("IBM_API_KEY", "   ")]));
        assert!(matches!(result, Err(AuthError::MissingToken)));

        let result = IbmCredentials::from_lookup(lookup(&[]));
        assert!(matches!(result, Err(AuthError::MissingToken)));
        assert!(AuthError::MissingToken.to_string().contains("IBM_API_KEY"));
    }

    #[test]
    fn test_env_instance_and_crn() {
        let creds = IbmCredentials::from_lookup(lookup(&[
            ("IBM_API_KEY", "key"),
            ("IBM_QUANTUM_INSTANCE", "Quantum_rng"),
        ]))
        .unwrap();
        assert_eq!(creds.instance(), Some("Quantum_rng"));
        assert_eq!(creds.service_crn(), None);

        let creds = creds.with_crn("crn:v1:bluemix:public:quantum-computing:us-east:a/1::");
        assert!(creds.service_crn().unwrap().starts_with("crn:"));
    }

    #[test]
    fn test_instance_given_as_crn() {
        let crn = "crn:v1:bluemix:public:quantum-computing:us-east:a/abc:def::";
        let creds = IbmCredentials::new("a".repeat(44)).with_instance(crn);
        assert_eq!(creds.service_crn(), Some(crn));

        // Already a CRN, so nothing is looked up
        let resolved = tokio_test::block_on(creds.resolve_instance()).unwrap();
        assert_eq!(resolved.service_crn(), Some(crn));
    }

    #[test]
    fn test_platform_token_instance_left_unresolved() {
        let creds = IbmCredentials::new("a".repeat(44)).with_instance("Quantum_rng");
        let resolved = tokio_test::block_on(creds.resolve_instance()).unwrap();
        assert_eq!(resolved.service_crn(), None);
        assert_eq!(resolved.instance(), Some("Quantum_rng"));
    }

    #[test]
    fn test_instance_search_query() {
        assert_eq!(
            instance_search_query("Quantum_rng"),
            r#"service_name:quantum-computing AND name:"Quantum_rng""#
        );
        assert_eq!(
            instance_search_query(r#"a"b"#),
            r#"service_name:quantum-computing AND name:"a\"b""#
        );
    }

    #[test]
    fn test_parse_instance_search() {
        let body = r#"{
            "items": [
                {"crn": "crn:v1:bluemix:public:quantum-computing:us-east:a/1f2e:9a8b::",
                 "name": "Quantum_rng"},
                {"crn": "crn:v1:bluemix:public:quantum-computing:eu-de:a/1f2e:7c6d::",
                 "name": "Quantum_rng_eu"}
            ],
            "limit": 10,
            "search_cursor": "abc"
        }"#;

        assert_eq!(
            parse_instance_search(body, "Quantum_rng").unwrap().as_deref(),
            Some("crn:v1:bluemix:public:quantum-computing:us-east:a/1f2e:9a8b::")
        );
        assert_eq!(
            parse_instance_search(body, "Quantum_rng_eu").unwrap().as_deref(),
            Some("crn:v1:bluemix:public:quantum-computing:eu-de:a/1f2e:7c6d::")
        );
        assert_eq!(parse_instance_search(body, "other").unwrap(), None);
        assert_eq!(parse_instance_search(r#"{"items": []}"#, "Quantum_rng").unwrap(), None);
        assert!(matches!(
            parse_instance_search("<html>", "Quantum_rng"),
            Err(AuthError::InstanceLookupFailed(_))
        ));
    }

    #[test]
    fn test_token_type_detection() {
        assert_eq!(TokenType::detect("ApiKey-abc123def456"), TokenType::ApiKey);
        assert_eq!(TokenType::detect("apikey-abc123def456"), TokenType::ApiKey);
        assert_eq!(TokenType::detect("some_regular_token"), TokenType::IqpToken);
    }

    #[test]
    fn test_channel() {
        assert_eq!(IbmChannel::parse("ibm_cloud"), IbmChannel::IbmCloud);
        assert_eq!(IbmChannel::parse("ibm_quantum_platform"), IbmChannel::IbmQuantum);
        assert_eq!(IbmChannel::IbmCloud.to_string(), "ibm_cloud");
        assert_eq!(
            IbmChannel::IbmQuantum.api_url(),
            "https://quantum.cloud.ibm.com/api/v1"
        );
    }

    #[test]
    fn test_validate_token() {
        assert!(IbmCredentials::new("a".repeat(44)).validate().is_ok());
        assert!(matches!(
            IbmCredentials::new("short").validate(),
            Err(AuthError::InvalidTokenFormat)
        ));
        assert!(matches!(
            IbmCredentials::new("").validate(),
            Err(AuthError::MissingToken)
        ));
    }

    #[test]
    fn test_qiskit_json_default_entry() {
        let json = r#"{
            "my-premium": {
                "channel": "ibm_cloud",
                "token": "premium_token_xyz",
                "instance": "crn:v1:bluemix:..."
            },
            "default-ibm-quantum-platform": {
                "channel": "ibm_quantum_platform",
                "token": "platform_token",
                "url": "https://quantum.cloud.ibm.com"
            }
        }"#;

        let creds = IbmCredentials::from_qiskit_json(json, None).unwrap();
        assert_eq!(creds.token(), "platform_token");
        assert_eq!(creds.channel(), IbmChannel::IbmQuantum);

        let creds = IbmCredentials::from_qiskit_json(json, Some("my-premium")).unwrap();
        assert_eq!(creds.channel(), IbmChannel::IbmCloud);
        assert!(creds.requires_iam_exchange());
        assert_eq!(creds.instance(), Some("crn:v1:bluemix:..."));

        assert!(matches!(
            IbmCredentials::from_qiskit_json(json, Some("absent")),
            Err(AuthError::ConfigParseError(_))
        ));
    }

    #[test]
    fn test_qiskit_json_empty() {
        assert!(matches!(
            IbmCredentials::from_qiskit_json("{}", None),
            Err(AuthError::ConfigParseError(_))
        ));
        assert!(matches!(
            IbmCredentials::from_qiskit_json("not json", None),
            Err(AuthError::ConfigParseError(_))
        ));
    }

    #[test]
    fn test_platform_token_header() {
        let creds = IbmCredentials::new("my_token");
        let header = tokio_test::block_on(creds.auth_header()).unwrap();
        assert_eq!(header, "Bearer my_token");
    }

    #[test]
    fn test_qiskit_config_path() {
        if let Some(path) = IbmCredentials::qiskit_config_path() {
            assert!(path.ends_with(".qiskit/qiskit-ibm.json") || path.ends_with(".qiskit\\qiskit-ibm.json"));
        }
    }
}

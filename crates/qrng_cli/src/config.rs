//! Run configuration
//!
//! Precedence, highest first: command-line flags, environment variables
//! (including a `.env` file), JSON config file, defaults.

use qrng_core::{bits, ibm};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for this schema
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Environment variable holds an unusable value
    #[error("Invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },

    /// Value out of its allowed range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for one generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RngConfig {
    /// Requested width; prompted for when unset
    pub bits: Option<usize>,

    /// IBM Quantum instance name or CRN
    pub instance: Option<String>,

    /// Backend tried before any other
    pub preferred_backend: String,

    /// `ibm_cloud` or `ibm_quantum`
    pub channel: Option<String>,

    /// Shots per job (only the first is used)
    pub shots: u64,

    /// Job wait limit in seconds
    pub timeout_secs: u64,

    /// Seed for the local simulator
    pub seed: Option<u64>,

    /// Skip IBM Quantum entirely
    pub local_only: bool,

    /// Server-side optimization level (0-3)
    pub optimization_level: u8,
}

impl Default for RngConfig {
    fn default() -> Self {
        Self {
            bits: None,
            instance: None,
            preferred_backend: ibm::PREFERRED_BACKEND.to_string(),
            channel: None,
            shots: ibm::DEFAULT_SHOTS,
            timeout_secs: ibm::DEFAULT_JOB_TIMEOUT_SECS,
            seed: None,
            local_only: false,
            optimization_level: 1,
        }
    }
}

impl RngConfig {
    /// Load `.env`, then the optional config file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Ok(env_file) = dotenvy::dotenv() {
            log::debug!("Loaded environment from {}", env_file.display());
        }

        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.merge_env(|key| std::env::var(key).ok())
    }

    /// Read a JSON config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse JSON; missing fields take their defaults
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Apply `QRNG_BITS`, `QRNG_BACKEND`, `QRNG_SEED`, `QRNG_LOCAL`,
    /// `IBM_QUANTUM_INSTANCE` and `IBM_QUANTUM_CHANNEL` from `lookup`
    pub fn merge_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("QRNG_BITS") {
            let n = bits::parse_request(&v).ok_or_else(|| ConfigError::InvalidEnv {
                var: "QRNG_BITS",
                value: v.clone(),
            })?;
            self.bits = Some(n);
        }
        if let Some(v) = get("QRNG_BACKEND") {
            self.preferred_backend = v;
        }
        if let Some(v) = get("QRNG_SEED") {
            let seed = v.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: "QRNG_SEED",
                value: v.clone(),
            })?;
            self.seed = Some(seed);
        }
        if let Some(v) = get("QRNG_LOCAL") {
            self.local_only = matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(v) = get("IBM_QUANTUM_INSTANCE") {
            self.instance = Some(v);
        }
        if let Some(v) = get("IBM_QUANTUM_CHANNEL") {
            self.channel = Some(v);
        }
        Ok(self)
    }

    /// Clamp `bits` and reject unusable settings
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        self.bits = self.bits.map(bits::clamp);

        if self.shots == 0 {
            return Err(ConfigError::Invalid("shots must be at least 1".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout must be positive".into()));
        }
        if self.optimization_level > 3 {
            return Err(ConfigError::Invalid(format!(
                "optimization level {} not in 0-3",
                self.optimization_level
            )));
        }
        if self.preferred_backend.trim().is_empty() {
            return Err(ConfigError::Invalid("preferred backend is empty".into()));
        }
        Ok(self)
    }
}

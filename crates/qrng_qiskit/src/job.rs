//! IBM Quantum job management
//!
//! Sampler V2 submission, status polling, and typed navigation of the
//! nested sampler result down to per-shot bitstrings.

use crate::client::{ClientError, IbmClient};
use chrono::{DateTime, Utc};
use num_bigint::BigUint;
use qrng_core::Bitstring;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Job errors
#[derive(Debug, Error)]
pub enum JobError {
    /// Client error
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// Job submission failed
    #[error("Job submission failed: {0}")]
    SubmissionFailed(String),

    /// Job execution failed
    #[error("Job execution failed: {0}")]
    ExecutionFailed(String),

    /// Job cancelled
    #[error("Job was cancelled")]
    Cancelled,

    /// Job timeout
    #[error("Job timed out after {0} seconds")]
    Timeout(u64),

    /// Result not available
    #[error("Job results not yet available")]
    ResultsNotReady,

    /// Result present but unusable
    #[error("Invalid job result: {0}")]
    Result(#[from] ResultError),
}

/// Failures while walking a sampler result down to its samples
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResultError {
    /// `results` is empty and no legacy distribution is present
    #[error("result contains no PUB results")]
    NoPubResults,

    /// First PUB result has no `data` (and no legacy counts)
    #[error("PUB result has no data field")]
    MissingData,

    /// Requested classical register is absent
    #[error("classical register '{register}' not in result (found: {available:?})")]
    MissingRegister {
        /// Register asked for
        register: String,
        /// Registers present
        available: Vec<String>,
    },

    /// Register holds no shots
    #[error("register '{0}' has no samples")]
    EmptySamples(String),

    /// A sample is neither hex nor binary
    #[error("sample '{0}' is not a hex or binary value")]
    InvalidSample(String),
}

/// Job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Job is queued
    #[serde(alias = "queued", alias = "Queued", alias = "PENDING", alias = "pending")]
    Queued,

    /// Job is validating
    #[serde(alias = "validating", alias = "Validating")]
    Validating,

    /// Job is running
    #[serde(alias = "running", alias = "Running")]
    Running,

    /// Job completed successfully
    #[serde(alias = "completed", alias = "Completed", alias = "DONE", alias = "done")]
    Completed,

    /// Job failed
    #[serde(alias = "failed", alias = "Failed", alias = "ERROR", alias = "error")]
    Failed,

    /// Job was cancelled
    #[serde(
        alias = "cancelled",
        alias = "Cancelled",
        alias = "CANCELED",
        alias = "canceled"
    )]
    Cancelled,

    /// Unknown status
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// Parse any of the spellings the API uses
    pub fn parse(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "QUEUED" | "PENDING" => JobStatus::Queued,
            "VALIDATING" => JobStatus::Validating,
            "RUNNING" => JobStatus::Running,
            "COMPLETED" | "DONE" => JobStatus::Completed,
            "FAILED" | "ERROR" => JobStatus::Failed,
            "CANCELLED" | "CANCELED" => JobStatus::Cancelled,
            _ => JobStatus::Unknown,
        }
    }

    /// Check if job is in terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Check if job is still in flight
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Queued | Self::Validating | Self::Running)
    }

    /// Check if job completed successfully
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

// ============================================================================
// Submission
// ============================================================================

/// Job submission request
#[derive(Debug, Clone, Serialize)]
pub struct JobSubmission {
    /// Program ID
    pub program_id: String,

    /// Backend name
    pub backend: String,

    /// Sampler parameters
    pub params: SamplerParams,

    /// Job tags
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// One primitive unified bloc: `[circuit, parameter values, shots]`
#[derive(Debug, Clone, Serialize)]
pub struct Pub(pub String, pub HashMap<String, serde_json::Value>, pub u64);

impl Pub {
    /// PUB for a circuit without parameters
    pub fn new(qasm: impl Into<String>, shots: u64) -> Self {
        Self(qasm.into(), HashMap::new(), shots)
    }
}

/// Sampler V2 parameters
#[derive(Debug, Clone, Serialize)]
pub struct SamplerParams {
    /// Primitive version (always 2)
    pub version: u8,

    /// Circuits to sample
    pub pubs: Vec<Pub>,

    /// Runtime options
    pub options: SamplerOptions,
}

/// Sampler runtime options
#[derive(Debug, Clone, Default, Serialize)]
pub struct SamplerOptions {
    /// Server-side transpiler optimization level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimization_level: Option<u8>,
}

impl SamplerParams {
    /// V2 parameters for the given PUBs
    pub fn new(pubs: Vec<Pub>) -> Self {
        Self {
            version: 2,
            pubs,
            options: SamplerOptions {
                optimization_level: Some(1),
            },
        }
    }

    /// Set optimization level
    pub fn with_optimization_level(mut self, level: u8) -> Self {
        self.options.optimization_level = Some(level);
        self
    }
}

/// Job submission / status response
#[derive(Debug, Clone, Deserialize)]
pub struct JobResponse {
    /// Job ID
    pub id: String,

    /// Backend
    pub backend: Option<String>,

    /// Status (absent on submit in the 2025 API)
    #[serde(default)]
    pub status: Option<JobStatus>,

    /// State (2025 alternative to status)
    pub state: Option<JobState>,

    /// Creation time
    pub created: Option<DateTime<Utc>>,

    /// Error message
    pub error: Option<JobErrorInfo>,
}

/// Job state (2025 API format)
#[derive(Debug, Clone, Deserialize)]
pub struct JobState {
    /// Status string
    pub status: Option<String>,
    /// Reason
    pub reason: Option<String>,
}

/// Job error information
#[derive(Debug, Clone, Deserialize)]
pub struct JobErrorInfo {
    /// Error message
    pub message: Option<String>,

    /// Error code
    pub code: Option<i32>,
}

impl JobResponse {
    /// Status from `status`, else `state.status`, else queued
    pub fn effective_status(&self) -> JobStatus {
        if let Some(status) = self.status {
            return status;
        }
        match self.state.as_ref().and_then(|s| s.status.as_deref()) {
            Some(s) => match JobStatus::parse(s) {
                JobStatus::Unknown => JobStatus::Queued,
                status => status,
            },
            None => JobStatus::Queued,
        }
    }

    /// Failure reason, if any
    pub fn failure_reason(&self) -> Option<String> {
        self.error
            .as_ref()
            .and_then(|e| e.message.clone())
            .or_else(|| self.state.as_ref().and_then(|s| s.reason.clone()))
    }
}

// ============================================================================
// Results
// ============================================================================

/// Sampler result body (`GET /jobs/{id}/results`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SamplerResult {
    /// One entry per PUB
    #[serde(default)]
    pub results: Vec<PubResult>,

    /// Legacy V1 quasi-probability distributions
    #[serde(default)]
    pub quasi_dists: Vec<HashMap<String, f64>>,
}

/// Result of a single PUB
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PubResult {
    /// Register name -> register data
    #[serde(default)]
    pub data: Option<HashMap<String, RegisterData>>,

    /// Legacy counts
    #[serde(default)]
    pub counts: Option<HashMap<String, u64>>,

    /// Legacy per-shot memory
    #[serde(default)]
    pub memory: Option<Vec<String>>,
}

/// Samples of one classical register
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterData {
    /// One hex string per shot, e.g. `"0x3"`
    #[serde(default)]
    pub samples: Vec<String>,

    /// Register width
    #[serde(default)]
    pub num_bits: Option<usize>,
}

impl SamplerResult {
    /// Per-shot bitstrings of `register` from the first PUB.
    ///
    /// `width` pads (or truncates) every sample to that many bits; without
    /// it the register's `num_bits` is used, else the widest sample.
    pub fn bitstrings(
        &self,
        register: &str,
        width: Option<usize>,
    ) -> Result<Vec<Bitstring>, ResultError> {
        let Some(first) = self.results.first() else {
            return self.legacy_quasi_dist(width);
        };

        let data = match first.data {
            Some(ref data) => data,
            None => return first.legacy_outcomes(width),
        };

        let reg = data.get(register).ok_or_else(|| {
            let mut available: Vec<String> = data.keys().cloned().collect();
            available.sort();
            ResultError::MissingRegister {
                register: register.to_string(),
                available,
            }
        })?;

        if reg.samples.is_empty() {
            return Err(ResultError::EmptySamples(register.to_string()));
        }

        let raw = reg
            .samples
            .iter()
            .map(|s| sample_to_bits(s))
            .collect::<Result<Vec<_>, _>>()?;

        let width = width
            .or(reg.num_bits)
            .unwrap_or_else(|| infer_width(&raw));
        Ok(raw.into_iter().map(|b| b.resized(width)).collect())
    }

    /// First shot of `register`
    pub fn first_bitstring(
        &self,
        register: &str,
        width: Option<usize>,
    ) -> Result<Bitstring, ResultError> {
        self.bitstrings(register, width)?
            .into_iter()
            .next()
            .ok_or_else(|| ResultError::EmptySamples(register.to_string()))
    }

    fn legacy_quasi_dist(&self, width: Option<usize>) -> Result<Vec<Bitstring>, ResultError> {
        let dist = self.quasi_dists.first().ok_or(ResultError::NoPubResults)?;
        let (key, _) = dist
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .ok_or(ResultError::NoPubResults)?;

        let bits = if key.starts_with("0x") {
            sample_to_bits(key)?
        } else {
            let value = BigUint::parse_bytes(key.as_bytes(), 10)
                .ok_or_else(|| ResultError::InvalidSample(key.clone()))?;
            Bitstring::parse(&value.to_str_radix(2))
                .map_err(|_| ResultError::InvalidSample(key.clone()))?
        };

        let width = width.unwrap_or(bits.len());
        Ok(vec![bits.resized(width)])
    }
}

impl PubResult {
    fn legacy_outcomes(&self, width: Option<usize>) -> Result<Vec<Bitstring>, ResultError> {
        let raw: Vec<&String> = if let Some(ref memory) = self.memory {
            memory.iter().collect()
        } else if let Some(ref counts) = self.counts {
            let mut entries: Vec<(&String, &u64)> = counts.iter().collect();
            entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            entries
                .into_iter()
                .flat_map(|(k, &n)| std::iter::repeat(k).take(n as usize))
                .collect()
        } else {
            return Err(ResultError::MissingData);
        };

        if raw.is_empty() {
            return Err(ResultError::EmptySamples("counts".to_string()));
        }

        let bits = raw
            .into_iter()
            .map(|s| sample_to_bits(s))
            .collect::<Result<Vec<_>, _>>()?;
        let width = width.unwrap_or_else(|| infer_width(&bits));
        Ok(bits.into_iter().map(|b| b.resized(width)).collect())
    }
}

/// Convert one sample to bits.
///
/// `0x`-prefixed values are hex of any length (4 bits per digit); other
/// values must already be binary.
pub fn sample_to_bits(sample: &str) -> Result<Bitstring, ResultError> {
    let invalid = || ResultError::InvalidSample(sample.to_string());
    let trimmed = sample.trim();

    match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) if !hex.is_empty() => {
            let mut bits = Vec::with_capacity(hex.len() * 4);
            for c in hex.chars() {
                let digit = c.to_digit(16).ok_or_else(invalid)?;
                bits.extend((0..4).rev().map(|i| (digit >> i) & 1 == 1));
            }
            Ok(Bitstring::new(bits))
        }
        Some(_) => Err(invalid()),
        None if !trimmed.is_empty() => Bitstring::parse(trimmed).map_err(|_| invalid()),
        None => Err(invalid()),
    }
}

/// Smallest width holding the widest sample (at least 1 bit)
fn infer_width(samples: &[Bitstring]) -> usize {
    samples
        .iter()
        .map(|b| b.bits().iter().skip_while(|&&bit| !bit).count())
        .max()
        .unwrap_or(0)
        .max(1)
}

// ============================================================================
// Job Handle
// ============================================================================

/// IBM Quantum job handle
pub struct IbmJob {
    id: String,
    client: IbmClient,
    status: JobStatus,
    backend: String,
    poll_interval: Duration,
}

impl IbmJob {
    pub(crate) fn new(response: JobResponse, backend: &str, client: IbmClient) -> Self {
        let status = response.effective_status();
        Self {
            id: response.id,
            status,
            backend: response.backend.unwrap_or_else(|| backend.to_string()),
            client,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the status polling interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Get job ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get backend name
    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Get last known status
    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Refresh job status
    pub async fn refresh(&mut self) -> Result<JobStatus, JobError> {
        let path = format!("/jobs/{}", self.id);
        let response: JobResponse = self.client.get_with_retry(&path, 3).await?;
        let status = response.effective_status();

        if status != self.status {
            log::debug!("Job {}: {:?} -> {:?}", self.id, self.status, status);
        }
        self.status = status;

        if status == JobStatus::Failed {
            return Err(JobError::ExecutionFailed(
                response
                    .failure_reason()
                    .unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }
        Ok(status)
    }

    /// Poll until the job finishes or `timeout` elapses
    pub async fn wait(&mut self, timeout: Duration) -> Result<JobStatus, JobError> {
        let start = Instant::now();

        loop {
            match self.refresh().await? {
                JobStatus::Completed => return Ok(JobStatus::Completed),
                JobStatus::Cancelled => return Err(JobError::Cancelled),
                _ => {}
            }

            if start.elapsed() > timeout {
                return Err(JobError::Timeout(timeout.as_secs()));
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Fetch the sampler result of a finished job
    pub async fn result(&self) -> Result<SamplerResult, JobError> {
        if !self.status.is_terminal() {
            return Err(JobError::ResultsNotReady);
        }

        let path = format!("/jobs/{}/results", self.id);
        Ok(self.client.get_with_retry(&path, 3).await?)
    }

    /// Cancel job
    pub async fn cancel(&mut self) -> Result<(), JobError> {
        let path = format!("/jobs/{}/cancel", self.id);
        self.client
            .post::<serde_json::Value, _>(&path, &serde_json::json!({}))
            .await
            .or_else(|e| match e {
                // Cancel returns 204 with an empty body
                ClientError::ParseError(_) => Ok(serde_json::Value::Null),
                other => Err(other),
            })?;
        self.status = JobStatus::Cancelled;
        Ok(())
    }
}

// ============================================================================
// Job Manager
// ============================================================================

/// Submits and looks up jobs
pub struct JobManager {
    client: IbmClient,
}

impl JobManager {
    /// Create new job manager
    pub fn new(client: IbmClient) -> Self {
        Self { client }
    }

    /// Submit a job
    pub async fn submit(&self, submission: JobSubmission) -> Result<IbmJob, JobError> {
        let response: JobResponse = self.client.post_with_retry("/jobs", &submission, 2).await?;

        if response.effective_status() == JobStatus::Failed {
            return Err(JobError::SubmissionFailed(
                response
                    .failure_reason()
                    .unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        log::info!("Submitted job {} to {}", response.id, submission.backend);
        Ok(IbmJob::new(response, &submission.backend, self.client.clone()))
    }

    /// Submit OpenQASM circuits to the Sampler V2 primitive
    pub async fn submit_sampler(
        &self,
        backend: &str,
        circuits: Vec<String>,
        shots: u64,
        optimization_level: u8,
    ) -> Result<IbmJob, JobError> {
        let pubs = circuits.into_iter().map(|c| Pub::new(c, shots)).collect();
        let submission = JobSubmission {
            program_id: "sampler".to_string(),
            backend: backend.to_string(),
            params: SamplerParams::new(pubs).with_optimization_level(optimization_level),
            tags: vec!["qrng".to_string()],
        };

        self.submit(submission).await
    }

    /// Get existing job by ID
    pub async fn get_job(&self, job_id: &str) -> Result<IbmJob, JobError> {
        let path = format!("/jobs/{}", job_id);
        let response: JobResponse = self.client.get(&path).await?;
        Ok(IbmJob::new(response, "", self.client.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Queued.is_running());
        assert_eq!(JobStatus::parse("done"), JobStatus::Completed);
        assert_eq!(JobStatus::parse("Canceled"), JobStatus::Cancelled);

        let status: JobStatus = serde_json::from_str("\"DONE\"").unwrap();
        assert_eq!(status, JobStatus::Completed);
        let status: JobStatus = serde_json::from_str("\"Weird\"").unwrap();
        assert_eq!(status, JobStatus::Unknown);
    }

    #[test]
    fn test_submission_serializes_pubs() {
        let submission = JobSubmission {
            program_id: "sampler".to_string(),
            backend: "ibm_sherbrooke".to_string(),
            params: SamplerParams::new(vec![Pub::new("OPENQASM 3.0;", 1)]),
            tags: vec![],
        };

        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "program_id": "sampler",
                "backend": "ibm_sherbrooke",
                "params": {
                    "version": 2,
                    "pubs": [["OPENQASM 3.0;", {}, 1]],
                    "options": {"optimization_level": 1}
                }
            })
        );
    }

    #[test]
    fn test_job_response_status() {
        let response: JobResponse =
            serde_json::from_str(r#"{"id": "j1", "backend": "ibm_sherbrooke", "status": "Queued"}"#)
                .unwrap();
        assert_eq!(response.effective_status(), JobStatus::Queued);

        let response: JobResponse = serde_json::from_str(r#"{"id": "d4lnn12v0j9c73e5h490"}"#).unwrap();
        assert_eq!(response.effective_status(), JobStatus::Queued);

        let response: JobResponse = serde_json::from_str(
            r#"{"id": "j2", "state": {"status": "Failed", "reason": "backend offline"}}"#,
        )
        .unwrap();
        assert_eq!(response.effective_status(), JobStatus::Failed);
        assert_eq!(response.failure_reason().as_deref(), Some("backend offline"));
    }

    #[test]
    fn test_sampler_v2_result() {
        let json = r#"{"results": [{"data": {"meas": {"samples": ["0x3", "0xa5"], "num_bits": 8}},
                       "metadata": {"circuit_metadata": {}}}], "metadata": {"version": 2}}"#;
        let result: SamplerResult = serde_json::from_str(json).unwrap();

        let bits = result.bitstrings("meas", None).unwrap();
        assert_eq!(bits[0].to_string(), "00000011");
        assert_eq!(bits[1].to_string(), "10100101");

        let first = result.first_bitstring("meas", Some(12)).unwrap();
        assert_eq!(first.to_string(), "000000000011");
    }

    #[test]
    fn test_sampler_256_bit_sample() {
        let hex = format!("0x{}", "f".repeat(64));
        let json = serde_json::json!({"results": [{"data": {"meas": {"samples": [hex]}}}]});
        let result: SamplerResult = serde_json::from_value(json).unwrap();

        let bits = result.first_bitstring("meas", Some(256)).unwrap();
        assert_eq!(bits.len(), 256);
        assert_eq!(bits.count_ones(), 256);
    }

    #[test]
    fn test_result_navigation_errors() {
        let empty: SamplerResult = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert_eq!(empty.bitstrings("meas", None), Err(ResultError::NoPubResults));

        let no_data: SamplerResult = serde_json::from_str(r#"{"results": [{}]}"#).unwrap();
        assert_eq!(no_data.bitstrings("meas", None), Err(ResultError::MissingData));

        let other_reg: SamplerResult =
            serde_json::from_str(r#"{"results": [{"data": {"c": {"samples": ["0x1"]}}}]}"#).unwrap();
        assert_eq!(
            other_reg.bitstrings("meas", None),
            Err(ResultError::MissingRegister {
                register: "meas".to_string(),
                available: vec!["c".to_string()],
            })
        );

        let no_samples: SamplerResult =
            serde_json::from_str(r#"{"results": [{"data": {"meas": {"samples": []}}}]}"#).unwrap();
        assert_eq!(
            no_samples.bitstrings("meas", None),
            Err(ResultError::EmptySamples("meas".to_string()))
        );

        let bad: SamplerResult =
            serde_json::from_str(r#"{"results": [{"data": {"meas": {"samples": ["0xzz"]}}}]}"#).unwrap();
        assert_eq!(
            bad.bitstrings("meas", None),
            Err(ResultError::InvalidSample("0xzz".to_string()))
        );
    }

    #[test]
    fn test_legacy_counts() {
        let json = r#"{"results": [{"counts": {"0x5": 1}}]}"#;
        let result: SamplerResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.first_bitstring("meas", Some(8)).unwrap().to_string(), "00000101");

        let json = r#"{"results": [{"counts": {"0110": 2, "1111": 1}}]}"#;
        let result: SamplerResult = serde_json::from_str(json).unwrap();
        let bits = result.bitstrings("meas", None).unwrap();
        assert_eq!(bits.len(), 3);
        assert_eq!(bits[0].to_string(), "0110");
    }

    #[test]
    fn test_legacy_quasi_dist() {
        let json = r#"{"quasi_dists": [{"3": 0.1, "200": 0.9}]}"#;
        let result: SamplerResult = serde_json::from_str(json).unwrap();
        let bits = result.first_bitstring("meas", Some(8)).unwrap();
        assert_eq!(bits.to_string(), "11001000");
    }

    #[test]
    fn test_sample_to_bits() {
        assert_eq!(sample_to_bits("0x0").unwrap().to_string(), "0000");
        assert_eq!(sample_to_bits("0X1F").unwrap().to_string(), "00011111");
        assert_eq!(sample_to_bits("101").unwrap().to_string(), "101");
        assert!(sample_to_bits("0x").is_err());
        assert!(sample_to_bits("").is_err());
        assert!(sample_to_bits("12").is_err());
    }

    #[test]
    fn test_infer_width() {
        let bits = vec![sample_to_bits("0x3").unwrap(), sample_to_bits("0x0").unwrap()];
        assert_eq!(infer_width(&bits), 2);
        assert_eq!(infer_width(&[sample_to_bits("0x0").unwrap()]), 1);
    }
}

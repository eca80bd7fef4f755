//! IBM Quantum backend implementation
//!
//! Synchronous facade over the async client: owns a Tokio runtime and
//! blocks on each remote step.

use crate::auth::{AuthError, IbmCredentials};
use crate::client::{BackendConfig, BackendInfo, BackendStatus, ClientError, IbmClient};
use crate::job::{JobError, JobManager, ResultError};
use crate::transpiler::{TranspileError, Transpiler, TranspilerConfig};
use qrng_backend::{Backend, ExecutionResult};
use qrng_core::{ibm, Circuit, QrngError, QrngResult};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::runtime::Runtime;
use url::Url;

const DEFAULT_NUM_QUBITS: usize = 127;
const DEFAULT_MAX_SHOTS: u64 = 100_000;

/// IBM Backend errors
#[derive(Debug, Error)]
pub enum IbmBackendError {
    /// Authentication error
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Client error
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// Job error
    #[error("Job error: {0}")]
    Job(#[from] JobError),

    /// Result could not be turned into bitstrings
    #[error("Result error: {0}")]
    Result(#[from] ResultError),

    /// Transpilation error
    #[error("Transpilation error: {0}")]
    Transpilation(#[from] TranspileError),

    /// No backend in the account is operational
    #[error("No operational backend available")]
    NoOperationalBackend,

    /// Runtime error
    #[error("Async runtime error: {0}")]
    Runtime(String),
}

/// IBM Quantum backend
pub struct IbmBackend {
    name: String,
    client: IbmClient,
    job_manager: JobManager,
    transpiler: Transpiler,
    runtime: Runtime,
    timeout: Duration,
    poll_interval: Duration,
    max_shots: u64,
}

impl IbmBackend {
    /// Connect to the service and target backend `name`.
    ///
    /// API keys are exchanged at IAM here, so bad credentials fail early.
    pub fn new(name: impl Into<String>, credentials: IbmCredentials) -> Result<Self, IbmBackendError> {
        let runtime = Runtime::new().map_err(|e| IbmBackendError::Runtime(e.to_string()))?;
        let client = runtime.block_on(IbmClient::connect(credentials))?;
        Self::with_client(name.into(), client, runtime)
    }

    /// Connect using auto-detected credentials
    pub fn auto_load(name: impl Into<String>) -> Result<Self, IbmBackendError> {
        Self::new(name, IbmCredentials::auto_load()?)
    }

    fn with_client(name: String, client: IbmClient, runtime: Runtime) -> Result<Self, IbmBackendError> {
        // Configuration is optional; some devices do not expose it
        let config: Option<BackendConfig> = runtime
            .block_on(client.get_backend_config(&name))
            .map_err(|e| log::debug!("No configuration for {}: {}", name, e))
            .ok();

        let num_qubits = config
            .as_ref()
            .and_then(|c| c.n_qubits)
            .unwrap_or(DEFAULT_NUM_QUBITS);
        let max_shots = config
            .as_ref()
            .and_then(|c| c.max_shots)
            .unwrap_or(DEFAULT_MAX_SHOTS);

        Ok(Self {
            job_manager: JobManager::new(client.clone()),
            transpiler: Transpiler::new(TranspilerConfig::for_backend(num_qubits)),
            name,
            client,
            runtime,
            timeout: Duration::from_secs(ibm::DEFAULT_JOB_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(5),
            max_shots,
        })
    }

    /// Point this connection at a different backend
    pub fn retarget(self, name: impl Into<String>) -> Result<Self, IbmBackendError> {
        Self::with_client(name.into(), self.client, self.runtime)
    }

    /// Set job timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set status polling interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set server-side optimization level
    pub fn with_optimization_level(mut self, level: u8) -> Self {
        let config = self.transpiler.config().clone().with_optimization_level(level);
        self.transpiler = Transpiler::new(config);
        self
    }

    // ========================================================================
    // Status
    // ========================================================================

    /// Current status of the target backend
    pub fn status(&self) -> Result<BackendStatus, IbmBackendError> {
        Ok(self.runtime.block_on(self.client.get_backend_status(&self.name))?)
    }

    /// Check if backend is operational
    pub fn is_operational(&self) -> Result<bool, IbmBackendError> {
        Ok(self.status()?.is_available())
    }

    /// Get pending jobs count
    pub fn pending_jobs(&self) -> Result<u64, IbmBackendError> {
        Ok(self.status()?.pending_jobs.unwrap_or(0))
    }

    /// All backends visible to these credentials
    pub fn list_backends(&self) -> Result<Vec<BackendInfo>, IbmBackendError> {
        Ok(self.runtime.block_on(self.client.list_backends())?)
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Validate, emit QASM and submit; returns the job ID
    pub fn submit(&self, circuit: &Circuit, shots: u64) -> Result<String, IbmBackendError> {
        self.transpiler.validate(circuit)?;
        let qasm = self.transpiler.to_qasm3(circuit);
        log::debug!("Submitting to {}:\n{}", self.name, qasm);

        let level = self.transpiler.config().optimization_level;
        let job = self.runtime.block_on(
            self.job_manager
                .submit_sampler(&self.name, vec![qasm], shots, level),
        )?;
        Ok(job.id().to_string())
    }

    /// Wait for `job_id`, fetch its result and decode `width`-bit outcomes
    pub fn collect(&self, job_id: &str, width: usize) -> Result<ExecutionResult, IbmBackendError> {
        let start = Instant::now();
        let register = self.transpiler.config().register.clone();

        let sampler = self.runtime.block_on(async {
            let mut job = self
                .job_manager
                .get_job(job_id)
                .await?
                .with_poll_interval(self.poll_interval);
            if !job.status().is_terminal() {
                job.wait(self.timeout).await?;
            }
            job.result().await
        })?;

        let memory = sampler
            .bitstrings(&register, Some(width))?
            .into_iter()
            .map(|b| b.to_string())
            .collect();

        let mut result = ExecutionResult::from_memory(memory, &self.name);
        result.metadata.job_id = Some(job_id.to_string());
        result.metadata.execution_time_ms = Some(start.elapsed().as_millis() as u64);
        result.metadata.simulated = false;
        Ok(result)
    }

    /// Submit, wait and decode in one call
    pub fn execute_sync(&self, circuit: &Circuit, shots: u64) -> Result<ExecutionResult, IbmBackendError> {
        let start = Instant::now();
        let job_id = self.submit(circuit, shots)?;
        log::info!("Job {} submitted, monitor at {}", job_id, job_monitor_url(&job_id));

        let mut result = self.collect(&job_id, Transpiler::register_width(circuit))?;
        result.metadata.execution_time_ms = Some(start.elapsed().as_millis() as u64);
        Ok(result)
    }
}

impl Backend for IbmBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_qubits(&self) -> usize {
        self.transpiler.config().num_qubits
    }

    fn execute(&self, circuit: &Circuit, shots: u64) -> QrngResult<ExecutionResult> {
        self.execute_sync(circuit, shots)
            .map_err(|e| QrngError::BackendError(e.to_string()))
    }

    fn is_simulator(&self) -> bool {
        false
    }

    fn max_shots(&self) -> u64 {
        self.max_shots
    }
}

// ============================================================================
// Backend Selection
// ============================================================================

/// Connect and pick a backend.
///
/// `preferred` is used when its status reports it operational; otherwise
/// the first operational backend in the account listing is taken.
pub fn select_backend(
    credentials: IbmCredentials,
    preferred: &str,
) -> Result<IbmBackend, IbmBackendError> {
    let backend = IbmBackend::new(preferred, credentials)?;

    match backend.is_operational() {
        Ok(true) => {
            log::info!("Using preferred backend {}", preferred);
            return Ok(backend);
        }
        Ok(false) => log::warn!("Preferred backend {} is not operational", preferred),
        Err(e) => log::warn!("Preferred backend {} unavailable: {}", preferred, e),
    }

    let listed = backend.list_backends()?;
    let name = first_operational(&listed, preferred)
        .ok_or(IbmBackendError::NoOperationalBackend)?
        .to_string();

    log::info!("Falling back to backend {}", name);
    backend.retarget(name)
}

/// First operational hardware backend other than `skip`
pub fn first_operational<'a>(backends: &'a [BackendInfo], skip: &str) -> Option<&'a str> {
    backends
        .iter()
        .find(|b| b.operational && !b.simulator && b.name != skip)
        .map(|b| b.name.as_str())
}

/// Dashboard link for a job
pub fn job_monitor_url(job_id: &str) -> String {
    Url::parse(ibm::JOB_MONITOR_URL)
        .and_then(|base| base.join(job_id))
        .map(String::from)
        .unwrap_or_else(|_| format!("{}{}", ibm::JOB_MONITOR_URL, job_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::parse_backend_list;
    use qrng_core::CircuitBuilder;

    #[test]
    fn test_job_monitor_url() {
        assert_eq!(
            job_monitor_url("d1abc23xyz"),
            "https://quantum.ibm.com/jobs/d1abc23xyz"
        );
    }

    #[test]
    fn test_first_operational() {
        let backends = parse_backend_list(
            r#"[{"name": "ibm_sherbrooke", "operational": true},
                {"name": "simulator_stabilizer", "operational": true, "simulator": true},
                {"name": "ibm_kyiv", "operational": false},
                {"name": "ibm_brisbane", "operational": true},
                {"name": "ibm_torino", "operational": true}]"#,
        )
        .unwrap();

        assert_eq!(first_operational(&backends, "ibm_sherbrooke"), Some("ibm_brisbane"));
        assert_eq!(first_operational(&backends, "other"), Some("ibm_sherbrooke"));
        assert_eq!(first_operational(&backends[1..3], "x"), None);
        assert_eq!(first_operational(&[], "x"), None);
    }

    #[test]
    fn test_error_display() {
        let err = IbmBackendError::from(TranspileError::TooManyQubits {
            required: 256,
            available: 127,
        });
        assert!(err.to_string().contains("256"));

        let err = IbmBackendError::from(ResultError::NoPubResults);
        assert!(err.to_string().starts_with("Result error"));
    }

    #[test]
    fn test_width_too_large_for_device() {
        let transpiler = Transpiler::new(TranspilerConfig::for_backend(DEFAULT_NUM_QUBITS));
        let circuit = CircuitBuilder::random_bits(256).build();
        assert!(transpiler.validate(&circuit).is_err());
    }

    // Tests below need IBM credentials and network access

    #[test]
    #[ignore]
    fn test_select_backend_live() {
        let creds = IbmCredentials::auto_load().unwrap();
        let backend = select_backend(creds, ibm::PREFERRED_BACKEND).unwrap();
        assert!(!backend.is_simulator());
        assert!(backend.num_qubits() >= 8);
    }

    #[test]
    #[ignore]
    fn test_execute_random_bits_live() {
        let creds = IbmCredentials::auto_load().unwrap();
        let backend = select_backend(creds, ibm::PREFERRED_BACKEND).unwrap();

        let circuit = CircuitBuilder::random_bits(8).build();
        let result = backend.execute_sync(&circuit, ibm::DEFAULT_SHOTS).unwrap();

        assert_eq!(result.first_bitstring().unwrap().len(), 8);
        assert!(result.metadata.job_id.is_some());
    }
}

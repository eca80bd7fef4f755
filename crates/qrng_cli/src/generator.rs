//! Random bit generation with local fallback
//!
//! Hardware path: credentials, backend selection, job, result decoding.
//! Any failure along it drops to the local simulator.

use crate::config::RngConfig;
use qrng_backend::{Backend, SimulatorBackend};
use qrng_core::{bits, ibm, Bitstring, CircuitBuilder, QrngError, QrngResult};
use qrng_qiskit::{
    job_monitor_url, select_backend, AuthError, IbmBackend, IbmBackendError, IbmChannel,
    IbmCredentials,
};
use serde::Serialize;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Where a hardware attempt stopped
#[derive(Debug, Error)]
pub enum HardwareError {
    /// No usable credentials
    #[error("IBM credentials unavailable: {0}")]
    Credentials(#[from] AuthError),

    /// Connection or backend selection failed
    #[error("Backend selection failed: {0}")]
    Selection(#[source] IbmBackendError),

    /// Submission, execution or decoding failed
    #[error("Quantum job failed: {0}")]
    Job(#[source] IbmBackendError),

    /// Job finished without any shot
    #[error("Quantum job failed: result contained no bitstring")]
    EmptyResult,
}

/// Origin of a generated bitstring
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Source {
    /// IBM Quantum hardware
    Hardware { backend: String, job_id: String },
    /// Local simulator
    Simulator,
}

/// Output of one run
#[derive(Debug, Clone)]
pub struct Generation {
    /// Exactly the requested width
    pub bits: Bitstring,
    pub source: Source,
    /// Time spent on the path that produced `bits`
    pub elapsed: Duration,
}

/// Quantum random bit generator
pub struct QuantumRng {
    config: RngConfig,
    progress: bool,
}

impl QuantumRng {
    pub fn new(config: RngConfig) -> Self {
        Self {
            config,
            progress: true,
        }
    }

    /// Print progress lines to stdout (off for JSON output)
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    fn say(&self, message: impl AsRef<str>) {
        log::debug!("{}", message.as_ref());
        if self.progress {
            println!("{}", message.as_ref());
        }
    }

    /// Generate `n` bits (clamped to the allowed range)
    pub fn generate(&self, n: usize) -> QrngResult<Generation> {
        self.generate_with(n, |n| self.generate_on_hardware(n))
    }

    /// Generate `n` bits, trying `hardware` first unless running local-only.
    ///
    /// Any `HardwareError` from `hardware` falls back to the simulator.
    pub fn generate_with<F>(&self, n: usize, hardware: F) -> QrngResult<Generation>
    where
        F: FnOnce(usize) -> Result<Generation, HardwareError>,
    {
        let n = bits::clamp(n);

        if self.config.local_only {
            log::info!("Local mode, skipping IBM Quantum");
        } else {
            match hardware(n) {
                Ok(generation) => return Ok(generation),
                Err(e) if self.progress => self.say(e.to_string()),
                Err(e) => log::warn!("{}; falling back to local simulator", e),
            }
        }

        self.generate_locally(n)
    }

    /// Credentials from env or `~/.qiskit`, with instance and channel applied
    pub fn credentials(&self) -> Result<IbmCredentials, AuthError> {
        self.configure(IbmCredentials::auto_load()?)
    }

    /// Apply the configured instance and channel to loaded credentials.
    ///
    /// Without any instance the default name is used; it is resolved to a
    /// CRN when the client connects.
    pub fn configure(&self, mut credentials: IbmCredentials) -> Result<IbmCredentials, AuthError> {
        if let Some(ref instance) = self.config.instance {
            credentials = credentials.with_instance(instance.as_str());
        } else if credentials.instance().is_none() {
            credentials = credentials.with_instance(ibm::DEFAULT_INSTANCE);
        }
        if let Some(ref channel) = self.config.channel {
            credentials = credentials.with_channel(IbmChannel::parse(channel));
        }
        credentials.validate()?;
        Ok(credentials)
    }

    fn connect(&self) -> Result<IbmBackend, HardwareError> {
        let credentials = self.credentials()?;
        let instance = credentials.instance().unwrap_or_default().to_string();
        let channel = credentials.channel();

        let backend = select_backend(credentials, &self.config.preferred_backend)
            .map_err(HardwareError::Selection)?
            .with_timeout(Duration::from_secs(self.config.timeout_secs))
            .with_optimization_level(self.config.optimization_level);

        self.say(format!("Connected to IBM Quantum ({})", channel));
        self.say(format!("Using IBM Quantum instance: {}", instance));
        self.say(format!("Selected backend: {}", backend.name()));
        Ok(backend)
    }

    fn generate_on_hardware(&self, n: usize) -> Result<Generation, HardwareError> {
        let path_start = Instant::now();
        let backend = self.connect()?;
        let circuit = CircuitBuilder::random_bits(n).build();

        let job_id = backend
            .submit(&circuit, self.config.shots)
            .map_err(HardwareError::Job)?;
        self.say(format!("Job submitted. ID: {}", job_id));
        self.say(format!("Monitor at: {}", job_monitor_url(&job_id)));

        let start = Instant::now();
        let result = backend.collect(&job_id, n).map_err(HardwareError::Job)?;
        let execution = start.elapsed();

        let bits = result
            .first_bitstring()
            .filter(|b| !b.is_empty())
            .ok_or(HardwareError::EmptyResult)?;
        self.say(format!(
            "Quantum generation successful in {:.2}s",
            execution.as_secs_f64()
        ));

        Ok(Generation {
            bits: bits.resized(n),
            source: Source::Hardware {
                backend: backend.name().to_string(),
                job_id,
            },
            elapsed: path_start.elapsed(),
        })
    }

    fn generate_locally(&self, n: usize) -> QrngResult<Generation> {
        let start = Instant::now();
        self.say("Using local quantum simulator...");

        let simulator = SimulatorBackend::new(n).with_optional_seed(self.config.seed);
        let circuit = CircuitBuilder::random_bits(n).build();
        let result = simulator.execute(&circuit, 1)?;
        let bits = result
            .first_bitstring()
            .ok_or_else(|| QrngError::EmptyResult("simulator returned no shot".into()))?;

        self.say("Local simulator successful!");
        Ok(Generation {
            bits: bits.resized(n),
            source: Source::Simulator,
            elapsed: start.elapsed(),
        })
    }
}

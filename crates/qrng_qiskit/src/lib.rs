//! # QRNG Qiskit
//!
//! IBM Quantum hardware access for QRNG.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use qrng_qiskit::prelude::*;
//! use qrng_core::CircuitBuilder;
//!
//! // Credentials from IBM_API_KEY / IBM_QUANTUM_TOKEN or ~/.qiskit
//! let credentials = IbmCredentials::auto_load()?;
//! let backend = select_backend(credentials, "ibm_sherbrooke")?;
//!
//! let circuit = CircuitBuilder::random_bits(16).build();
//! let result = backend.execute_sync(&circuit, 1)?;
//!
//! println!("Bits: {:?}", result.first_bitstring());
//! ```
//!
//! ## Environment Variables
//!
//! ```bash
//! export IBM_API_KEY="your-cloud-api-key"           # IAM key, IBM Cloud channel
//! export IBM_QUANTUM_INSTANCE="crn:v1:bluemix:..."  # Optional
//! export IBM_QUANTUM_CHANNEL="ibm_cloud"            # Optional
//! ```
//!
//! ## Submitting Without Waiting
//!
//! ```rust,ignore
//! let job_id = backend.submit(&circuit, 1)?;
//! println!("Monitor: {}", job_monitor_url(&job_id));
//!
//! // Later
//! let result = backend.collect(&job_id, 16)?;
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Credentials and IAM token exchange
pub mod auth;

/// REST API client
pub mod client;

/// Sampler jobs and result decoding
pub mod job;

/// OpenQASM 3 emission
pub mod transpiler;

/// IBM backend implementation
pub mod backend;

// ============================================================================
// Re-exports
// ============================================================================

pub use auth::{
    is_crn, parse_instance_search, AuthError, CredentialSource, IbmChannel, IbmCredentials,
    TokenType,
};
pub use backend::{first_operational, job_monitor_url, select_backend, IbmBackend, IbmBackendError};
pub use client::{
    parse_backend_list, BackendConfig, BackendInfo, BackendStatus, ClientError, IbmClient,
};
pub use job::{
    sample_to_bits, IbmJob, JobError, JobManager, JobResponse, JobStatus, JobSubmission,
    ResultError, SamplerResult,
};
pub use transpiler::{TranspileError, Transpiler, TranspilerConfig, IBM_BASIS_GATES};

// ============================================================================
// Prelude
// ============================================================================

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::auth::{IbmChannel, IbmCredentials};
    pub use crate::backend::{job_monitor_url, select_backend, IbmBackend, IbmBackendError};
    pub use crate::client::IbmClient;
    pub use crate::job::{JobManager, JobStatus, SamplerResult};
    pub use crate::transpiler::{Transpiler, TranspilerConfig};
}

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use qrng_core::{Bitstring, CircuitBuilder};

    #[test]
    fn test_credentials_creation() {
        let creds = IbmCredentials::new("test_token_12345678901234567890123456789012");
        assert_eq!(creds.channel(), IbmChannel::IbmQuantum);
        assert_eq!(creds.source(), &CredentialSource::Explicit);
    }

    #[test]
    fn test_random_bits_to_qasm() {
        let circuit = CircuitBuilder::random_bits(8).build();
        let transpiler = Transpiler::new(TranspilerConfig::default());
        let qasm = transpiler.to_qasm3(&circuit);

        assert!(qasm.contains("OPENQASM 3.0"));
        assert!(qasm.contains("qubit[8] q;"));
        assert!(qasm.contains("bit[8] meas;"));
        assert_eq!(qasm.matches("= measure").count(), 8);
    }

    #[test]
    fn test_transpiler_validation() {
        let circuit = CircuitBuilder::random_bits(5).build();

        let transpiler = Transpiler::new(TranspilerConfig::for_backend(127));
        assert!(transpiler.validate(&circuit).is_ok());

        let transpiler_small = Transpiler::new(TranspilerConfig::for_backend(3));
        assert!(transpiler_small.validate(&circuit).is_err());
    }

    #[test]
    fn test_channel_urls() {
        // Both channels use the unified quantum.cloud.ibm.com endpoint
        assert_eq!(
            IbmChannel::IbmQuantum.api_url(),
            "https://quantum.cloud.ibm.com/api/v1"
        );
        assert_eq!(IbmChannel::IbmCloud.base_url(), IbmChannel::IbmQuantum.base_url());
    }

    #[test]
    fn test_sampler_result_end_to_end() {
        // 8-bit register, one shot; qubit 0 is the rightmost bit
        let json = r#"{
            "results": [
                {"data": {"meas": {"samples": ["0x81"], "num_bits": 8}}, "metadata": {}}
            ],
            "metadata": {"version": 2}
        }"#;

        let result: SamplerResult = serde_json::from_str(json).unwrap();
        let bits = result.first_bitstring("meas", Some(8)).unwrap();

        assert_eq!(bits, "10000001".parse::<Bitstring>().unwrap());
        assert_eq!(bits.count_ones(), 2);
    }

    #[test]
    fn test_backend_listing_selection() {
        let body = r#"{"devices": [
            {"name": "ibm_sherbrooke", "qubits": 127, "status": {"name": "offline"}},
            {"name": "ibm_brisbane", "qubits": 127, "status": {"name": "online"}}
        ]}"#;

        let backends = parse_backend_list(body).unwrap();
        assert_eq!(first_operational(&backends, ""), Some("ibm_brisbane"));
    }
}

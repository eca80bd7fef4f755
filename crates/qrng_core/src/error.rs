//! Error types for QRNG
//!
//! Shared error enum for circuits, bitstrings and local execution.

// Error variant fields are self-documenting via error messages
#![allow(missing_docs)]

use thiserror::Error;

/// Main error type for QRNG
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QrngError {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    /// Qubit index out of range
    #[error("Qubit {qubit} out of range: max is {max}")]
    QubitOutOfRange { qubit: usize, max: usize },

    /// Invalid bitstring format
    #[error("Invalid bitstring '{0}': must contain only '0' and '1'")]
    InvalidBitstring(String),

    /// Invalid angle
    #[error("Invalid angle {0}: must be finite")]
    InvalidAngle(f64),

    /// Requested bit count outside the supported window
    #[error("Bit count {requested} out of range [{min}, {max}]")]
    BitCountOutOfRange {
        requested: usize,
        min: usize,
        max: usize,
    },

    // ========================================================================
    // Circuit Errors
    // ========================================================================
    /// Empty circuit
    #[error("Circuit is empty")]
    EmptyCircuit,

    /// Gate on non-existent qubit
    #[error("Gate references qubit {qubit} but circuit has only {num_qubits} qubits")]
    GateQubitMismatch { qubit: usize, num_qubits: usize },

    // ========================================================================
    // Backend Errors
    // ========================================================================
    /// Backend execution error
    #[error("Backend error: {0}")]
    BackendError(String),

    /// Backend not available
    #[error("Backend '{0}' not available")]
    BackendNotAvailable(String),

    /// Shots out of range
    #[error("Shots {0} out of range [{1}, {2}]")]
    ShotsOutOfRange(u64, u64, u64),

    /// Result did not contain a usable bitstring
    #[error("No measurement outcome in result: {0}")]
    EmptyResult(String),

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(String),

    /// File I/O error
    #[error("File error: {0}")]
    FileError(String),
}

/// Result type alias for QRNG operations
pub type QrngResult<T> = Result<T, QrngError>;

// ============================================================================
// Error Conversion Helpers
// ============================================================================

impl From<serde_json::Error> for QrngError {
    fn from(err: serde_json::Error) -> Self {
        QrngError::JsonError(err.to_string())
    }
}

impl From<std::io::Error> for QrngError {
    fn from(err: std::io::Error) -> Self {
        QrngError::FileError(err.to_string())
    }
}

impl QrngError {
    /// Check if error is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            QrngError::QubitOutOfRange { .. }
                | QrngError::InvalidBitstring(_)
                | QrngError::InvalidAngle(_)
                | QrngError::BitCountOutOfRange { .. }
        )
    }

    /// Check if error came from a backend rather than from the caller's input
    pub fn is_backend_error(&self) -> bool {
        matches!(
            self,
            QrngError::BackendError(_)
                | QrngError::BackendNotAvailable(_)
                | QrngError::EmptyResult(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QrngError::InvalidBitstring("01x".into());
        assert!(err.to_string().contains("01x"));
    }

    #[test]
    fn test_bit_count_display() {
        let err = QrngError::BitCountOutOfRange {
            requested: 512,
            min: 8,
            max: 256,
        };
        let msg = err.to_string();
        assert!(msg.contains("512"));
        assert!(msg.contains("256"));
    }

    #[test]
    fn test_classification() {
        assert!(QrngError::InvalidAngle(f64::NAN).is_validation_error());
        assert!(!QrngError::EmptyCircuit.is_validation_error());
        assert!(QrngError::BackendError("down".into()).is_backend_error());
        assert!(!QrngError::EmptyCircuit.is_backend_error());
    }
}

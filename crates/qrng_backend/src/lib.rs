//! # QRNG Backend
//!
//! Backend abstraction and the local simulator used as a fallback.
//!
//! ## Quick Start
//!
//! ```rust
//! use qrng_backend::prelude::*;
//! use qrng_core::CircuitBuilder;
//!
//! let backend = SimulatorBackend::max_width().with_seed(42);
//! let circuit = CircuitBuilder::random_bits(16).build();
//!
//! let result = backend.execute(&circuit, 1).unwrap();
//! let bits = result.first_bitstring().unwrap();
//! assert_eq!(bits.len(), 16);
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Execution types and backend trait
pub mod execution;

/// Product-state simulator backend
pub mod simulator;

// ============================================================================
// Re-exports
// ============================================================================

pub use execution::{Backend, ExecutionMetadata, ExecutionResult};
pub use simulator::SimulatorBackend;

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use qrng_backend::prelude::*;
    //! ```

    pub use crate::execution::{Backend, ExecutionMetadata, ExecutionResult};
    pub use crate::simulator::SimulatorBackend;
}

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use approx::assert_abs_diff_eq;
    use qrng_core::{bits, BitStatistics, CircuitBuilder};

    #[test]
    fn test_backend_trait_object() {
        let backend: Box<dyn Backend> = Box::new(SimulatorBackend::new(8).with_name("local"));

        assert_eq!(backend.name(), "local");
        assert_eq!(backend.num_qubits(), 8);
        assert!(backend.is_simulator());
    }

    #[test]
    fn test_every_width_in_range() {
        let backend = SimulatorBackend::max_width().with_seed(11);

        for n in [bits::MIN, 9, 100, bits::MAX] {
            let circuit = CircuitBuilder::random_bits(n).build();
            let bits = backend.execute(&circuit, 1).unwrap().first_bitstring().unwrap();
            assert_eq!(bits.len(), n);
        }
    }

    #[test]
    fn test_long_run_is_balanced() {
        // Aggregate many shots; each qubit is an unbiased coin
        let backend = SimulatorBackend::new(32).with_seed(2024);
        let circuit = CircuitBuilder::random_bits(32).build();

        let result = backend.execute(&circuit, 200).unwrap();
        let (mut ones, mut total) = (0usize, 0usize);
        for shot in &result.memory {
            let stats = BitStatistics::from_bitstring(&shot.parse().unwrap());
            ones += stats.ones;
            total += stats.len;
        }

        let ratio = ones as f64 / total as f64;
        assert_abs_diff_eq!(ratio, 0.5, epsilon = 0.03);
    }

    #[test]
    fn test_batch_execution() {
        let backend = SimulatorBackend::new(8).with_seed(5);
        let circuits: Vec<_> = (1..=4)
            .map(|n| CircuitBuilder::random_bits(n).build())
            .collect();

        let results = backend.execute_batch(&circuits, 3).unwrap();

        assert_eq!(results.len(), 4);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.shots, 3);
            assert_eq!(result.memory[0].len(), i + 1);
        }
    }
}

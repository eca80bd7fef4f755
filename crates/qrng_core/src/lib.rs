//! # QRNG Core
//!
//! Circuits, bitstrings and bit statistics for the quantum random bit
//! generator.
//!
//! ## Quick Start
//!
//! ```rust
//! use qrng_core::prelude::*;
//!
//! // The fixed generator circuit: H on every qubit, then measure
//! let circuit = CircuitBuilder::random_bits(8).build();
//! assert_eq!(circuit.num_qubits(), 8);
//! assert_eq!(circuit.count_1q(), 8);
//! ```
//!
//! ## Statistics
//!
//! ```rust
//! use qrng_core::prelude::*;
//!
//! let bits = Bitstring::parse("10110010").unwrap();
//! let stats = BitStatistics::from_bitstring(&bits);
//!
//! assert_eq!(stats.ones, 4);
//! assert!(stats.passes_balance_test());
//! assert_eq!(bits.to_decimal_string(), "178");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Core types
pub mod types;

/// Constants
pub mod constants;

/// Error types
pub mod error;

/// Quantum gates
pub mod gate;

/// Circuit structure
pub mod circuit;

/// Circuit builder
pub mod builder;

/// Bit statistics
pub mod stats;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::CircuitBuilder;
pub use circuit::Circuit;
pub use constants::{bits, entropy, ibm};
pub use error::{QrngError, QrngResult};
pub use gate::Gate;
pub use stats::BitStatistics;
pub use types::{Angle, Bitstring, Counts, QubitId};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use qrng_core::prelude::*;
    //! ```

    pub use crate::builder::CircuitBuilder;
    pub use crate::circuit::Circuit;
    pub use crate::constants::{bits, entropy, ibm};
    pub use crate::error::{QrngError, QrngResult};
    pub use crate::gate::Gate;
    pub use crate::stats::BitStatistics;
    pub use crate::types::{Angle, Bitstring, Counts, QubitId};
}

// ============================================================================
// Version Information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

// ============================================================================
// Integration Tests
// ============================================================================

//! Quantum gate definitions for QRNG
//!
//! Single-qubit gates plus measurement. The generator never entangles
//! qubits, so there are no multi-qubit unitaries.

use crate::types::{Angle, QubitId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quantum gate enumeration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    // ========================================================================
    // Single-Qubit Gates (Non-Parameterized)
    // ========================================================================
    /// Hadamard gate
    H(QubitId),

    /// Pauli-X gate (NOT)
    X(QubitId),

    /// Pauli-Y gate
    Y(QubitId),

    /// Pauli-Z gate
    Z(QubitId),

    /// S gate (sqrt(Z))
    S(QubitId),

    /// S-dagger gate (inverse of S)
    Sdg(QubitId),

    /// SX gate (sqrt(X))
    Sx(QubitId),

    // ========================================================================
    // Single-Qubit Gates (Parameterized)
    // ========================================================================
    /// X rotation
    Rx(QubitId, Angle),

    /// Y rotation
    Ry(QubitId, Angle),

    /// Z rotation
    Rz(QubitId, Angle),

    // ========================================================================
    // Measurement and Control
    // ========================================================================
    /// Measure one qubit into the classical bit of the same index
    Measure(QubitId),

    /// Measure every qubit
    MeasureAll,

    /// Barrier (empty list means all qubits)
    Barrier(Vec<QubitId>),
}

impl Gate {
    /// Get qubits involved in this gate
    pub fn qubits(&self) -> Vec<QubitId> {
        match self {
            Gate::H(q)
            | Gate::X(q)
            | Gate::Y(q)
            | Gate::Z(q)
            | Gate::S(q)
            | Gate::Sdg(q)
            | Gate::Sx(q)
            | Gate::Rx(q, _)
            | Gate::Ry(q, _)
            | Gate::Rz(q, _)
            | Gate::Measure(q) => vec![*q],

            Gate::MeasureAll => vec![], // Applied to all qubits
            Gate::Barrier(qs) => qs.clone(),
        }
    }

    /// Check if gate is a single-qubit unitary
    pub fn is_single_qubit(&self) -> bool {
        !matches!(self, Gate::Measure(_) | Gate::MeasureAll | Gate::Barrier(_))
    }

    /// Check if gate is parameterized
    pub fn is_parameterized(&self) -> bool {
        matches!(self, Gate::Rx(_, _) | Gate::Ry(_, _) | Gate::Rz(_, _))
    }

    /// Check if gate is measurement
    pub fn is_measurement(&self) -> bool {
        matches!(self, Gate::Measure(_) | Gate::MeasureAll)
    }

    /// Check if gate is a barrier
    pub fn is_barrier(&self) -> bool {
        matches!(self, Gate::Barrier(_))
    }

    /// Rotation angle, if any
    pub fn angle(&self) -> Option<Angle> {
        match self {
            Gate::Rx(_, a) | Gate::Ry(_, a) | Gate::Rz(_, a) => Some(*a),
            _ => None,
        }
    }

    /// Get gate name
    pub fn name(&self) -> &'static str {
        match self {
            Gate::H(_) => "h",
            Gate::X(_) => "x",
            Gate::Y(_) => "y",
            Gate::Z(_) => "z",
            Gate::S(_) => "s",
            Gate::Sdg(_) => "sdg",
            Gate::Sx(_) => "sx",
            Gate::Rx(_, _) => "rx",
            Gate::Ry(_, _) => "ry",
            Gate::Rz(_, _) => "rz",
            Gate::Measure(_) | Gate::MeasureAll => "measure",
            Gate::Barrier(_) => "barrier",
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gate::Rx(q, a) | Gate::Ry(q, a) | Gate::Rz(q, a) => {
                write!(f, "{}({}) q[{}]", self.name(), a, q)
            }
            Gate::Measure(q) => write!(f, "measure q[{}]", q),
            Gate::MeasureAll => write!(f, "measure_all"),
            Gate::Barrier(qs) if qs.is_empty() => write!(f, "barrier"),
            Gate::Barrier(qs) => {
                let list: Vec<String> = qs.iter().map(|q| format!("q[{}]", q)).collect();
                write!(f, "barrier {}", list.join(","))
            }
            _ => write!(f, "{} q[{}]", self.name(), self.qubits()[0]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qubits() {
        assert_eq!(Gate::H(3).qubits(), vec![3]);
        assert!(Gate::MeasureAll.qubits().is_empty());
        assert_eq!(Gate::Barrier(vec![0, 2]).qubits(), vec![0, 2]);
    }

    #[test]
    fn test_classification() {
        assert!(Gate::H(0).is_single_qubit());
        assert!(Gate::Rz(0, 0.1).is_parameterized());
        assert!(!Gate::H(0).is_parameterized());
        assert!(Gate::Measure(1).is_measurement());
        assert!(Gate::MeasureAll.is_measurement());
        assert!(!Gate::MeasureAll.is_single_qubit());
        assert!(Gate::Barrier(vec![]).is_barrier());
    }

    #[test]
    fn test_display() {
        assert_eq!(Gate::H(2).to_string(), "h q[2]");
        assert_eq!(Gate::Rz(0, 0.5).to_string(), "rz(0.5) q[0]");
        assert_eq!(Gate::MeasureAll.to_string(), "measure_all");
    }
}

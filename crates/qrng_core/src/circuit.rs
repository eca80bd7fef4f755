//! Quantum circuit structure for QRNG
//!
//! Provides the core Circuit struct that every backend executes.

use crate::error::{QrngError, QrngResult};
use crate::gate::Gate;
use crate::types::QubitId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Quantum circuit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Number of qubits
    num_qubits: usize,

    /// Gate sequence
    gates: Vec<Gate>,

    /// Optional circuit name
    name: Option<String>,
}

impl Circuit {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a new empty circuit
    pub fn new(num_qubits: usize) -> Self {
        Self {
            num_qubits,
            gates: Vec::new(),
            name: None,
        }
    }

    /// Create a circuit with a name
    pub fn with_name(num_qubits: usize, name: impl Into<String>) -> Self {
        Self {
            num_qubits,
            gates: Vec::new(),
            name: Some(name.into()),
        }
    }

    /// Create from a vector of gates
    pub fn from_gates(num_qubits: usize, gates: Vec<Gate>) -> QrngResult<Self> {
        let mut circuit = Self::new(num_qubits);
        circuit.add_gates(gates)?;
        Ok(circuit)
    }

    // ========================================================================
    // Basic Operations
    // ========================================================================

    /// Add a gate to the circuit
    pub fn add_gate(&mut self, gate: Gate) -> QrngResult<()> {
        for &qubit in &gate.qubits() {
            if qubit >= self.num_qubits {
                return Err(QrngError::GateQubitMismatch {
                    qubit,
                    num_qubits: self.num_qubits,
                });
            }
        }
        if let Some(angle) = gate.angle() {
            if !angle.is_finite() {
                return Err(QrngError::InvalidAngle(angle));
            }
        }
        self.gates.push(gate);
        Ok(())
    }

    /// Add multiple gates
    pub fn add_gates(&mut self, gates: impl IntoIterator<Item = Gate>) -> QrngResult<()> {
        for gate in gates {
            self.add_gate(gate)?;
        }
        Ok(())
    }

    /// Get number of qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Get gates
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Get circuit name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set circuit name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Check if circuit is empty
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    // ========================================================================
    // Circuit Analysis
    // ========================================================================

    /// Calculate circuit depth (longest path)
    pub fn depth(&self) -> usize {
        let mut qubit_depths = vec![0usize; self.num_qubits];

        for gate in &self.gates {
            let qubits = gate.qubits();
            if qubits.is_empty() {
                // MeasureAll or global barrier
                let max_depth = qubit_depths.iter().copied().max().unwrap_or(0);
                for d in &mut qubit_depths {
                    *d = max_depth + 1;
                }
            } else {
                for q in qubits {
                    qubit_depths[q] += 1;
                }
            }
        }

        qubit_depths.into_iter().max().unwrap_or(0)
    }

    /// Get total gate count
    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    /// Count single-qubit unitaries
    pub fn count_1q(&self) -> usize {
        self.gates.iter().filter(|g| g.is_single_qubit()).count()
    }

    /// Count measurement operations
    pub fn count_measurements(&self) -> usize {
        self.gates.iter().filter(|g| g.is_measurement()).count()
    }

    /// Check whether any measurement is present
    pub fn has_measurement(&self) -> bool {
        self.gates.iter().any(|g| g.is_measurement())
    }

    /// Qubits that end up in the classical register, ascending
    pub fn measured_qubits(&self) -> Vec<QubitId> {
        let mut measured = BTreeSet::new();
        for gate in &self.gates {
            match gate {
                Gate::MeasureAll => return (0..self.num_qubits).collect(),
                Gate::Measure(q) => {
                    measured.insert(*q);
                }
                _ => {}
            }
        }
        measured.into_iter().collect()
    }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Circuit({} qubits, {} gates)",
            self.num_qubits,
            self.gates.len()
        )?;
        writeln!(f, "  Depth: {}", self.depth())?;
        writeln!(f, "  1Q gates: {}", self.count_1q())?;
        writeln!(f, "  Measurements: {}", self.count_measurements())?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circuit_new() {
        let circuit = Circuit::new(5);
        assert_eq!(circuit.num_qubits(), 5);
        assert!(circuit.is_empty());
        assert_eq!(circuit.depth(), 0);
    }

    #[test]
    fn test_add_gate_out_of_range() {
        let mut circuit = Circuit::new(2);
        assert!(circuit.add_gate(Gate::H(1)).is_ok());
        assert_eq!(
            circuit.add_gate(Gate::H(2)),
            Err(QrngError::GateQubitMismatch {
                qubit: 2,
                num_qubits: 2
            })
        );
    }

    #[test]
    fn test_add_gate_rejects_nan_angle() {
        let mut circuit = Circuit::new(1);
        assert!(matches!(
            circuit.add_gate(Gate::Rx(0, f64::NAN)),
            Err(QrngError::InvalidAngle(_))
        ));
    }

    #[test]
    fn test_depth_with_measure_all() {
        let circuit =
            Circuit::from_gates(3, vec![Gate::H(0), Gate::H(1), Gate::X(1), Gate::MeasureAll])
                .unwrap();
        assert_eq!(circuit.depth(), 3);
    }

    #[test]
    fn test_measured_qubits() {
        let partial = Circuit::from_gates(4, vec![Gate::Measure(3), Gate::Measure(1)]).unwrap();
        assert_eq!(partial.measured_qubits(), vec![1, 3]);

        let all = Circuit::from_gates(3, vec![Gate::H(0), Gate::MeasureAll]).unwrap();
        assert_eq!(all.measured_qubits(), vec![0, 1, 2]);

        let none = Circuit::from_gates(2, vec![Gate::H(0)]).unwrap();
        assert!(none.measured_qubits().is_empty());
        assert!(!none.has_measurement());
    }
}

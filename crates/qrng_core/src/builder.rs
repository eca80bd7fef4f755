//! Circuit builder for QRNG
//!
//! Fluent builder for circuits, including the fixed random-bit circuit.

use crate::circuit::Circuit;
use crate::error::QrngResult;
use crate::gate::Gate;
use crate::types::{Angle, QubitId};

/// Fluent circuit builder (consuming self pattern)
///
/// Gates that reference a qubit outside the circuit are dropped; use
/// [`CircuitBuilder::try_build`] when that should surface as an error.
pub struct CircuitBuilder {
    circuit: Circuit,
    rejected: Option<crate::error::QrngError>,
}

impl CircuitBuilder {
    /// Create a new circuit builder
    pub fn new(num_qubits: usize) -> Self {
        Self {
            circuit: Circuit::new(num_qubits),
            rejected: None,
        }
    }

    /// Create with circuit name
    pub fn with_name(num_qubits: usize, name: impl Into<String>) -> Self {
        Self {
            circuit: Circuit::with_name(num_qubits, name),
            rejected: None,
        }
    }

    /// The random-bit circuit: Hadamard on every qubit, then measure all.
    ///
    /// Each qubit collapses to 0 or 1 with equal probability.
    pub fn random_bits(num_qubits: usize) -> Self {
        Self::with_name(num_qubits, "random_bits").h_layer().measure_all()
    }

    fn push(mut self, gate: Gate) -> Self {
        if let Err(e) = self.circuit.add_gate(gate) {
            self.rejected.get_or_insert(e);
        }
        self
    }

    // ========================================================================
    // Single-Qubit Gates
    // ========================================================================

    /// Add Hadamard gate
    pub fn h(self, qubit: QubitId) -> Self {
        self.push(Gate::H(qubit))
    }

    /// Add Pauli-X gate
    pub fn x(self, qubit: QubitId) -> Self {
        self.push(Gate::X(qubit))
    }

    /// Add Pauli-Y gate
    pub fn y(self, qubit: QubitId) -> Self {
        self.push(Gate::Y(qubit))
    }

    /// Add Pauli-Z gate
    pub fn z(self, qubit: QubitId) -> Self {
        self.push(Gate::Z(qubit))
    }

    /// Add S gate
    pub fn s(self, qubit: QubitId) -> Self {
        self.push(Gate::S(qubit))
    }

    /// Add S-dagger gate
    pub fn sdg(self, qubit: QubitId) -> Self {
        self.push(Gate::Sdg(qubit))
    }

    /// Add SX gate
    pub fn sx(self, qubit: QubitId) -> Self {
        self.push(Gate::Sx(qubit))
    }

    /// Add Rx rotation
    pub fn rx(self, qubit: QubitId, angle: Angle) -> Self {
        self.push(Gate::Rx(qubit, angle))
    }

    /// Add Ry rotation
    pub fn ry(self, qubit: QubitId, angle: Angle) -> Self {
        self.push(Gate::Ry(qubit, angle))
    }

    /// Add Rz rotation
    pub fn rz(self, qubit: QubitId, angle: Angle) -> Self {
        self.push(Gate::Rz(qubit, angle))
    }

    // ========================================================================
    // Layers
    // ========================================================================

    /// Hadamard on every qubit
    pub fn h_layer(self) -> Self {
        let n = self.circuit.num_qubits();
        (0..n).fold(self, |b, q| b.h(q))
    }

    /// Ry rotation on every qubit with the given angles
    pub fn ry_layer(self, angles: &[Angle]) -> Self {
        angles
            .iter()
            .enumerate()
            .fold(self, |b, (q, &a)| b.ry(q, a))
    }

    // ========================================================================
    // Measurement and Control
    // ========================================================================

    /// Measure one qubit
    pub fn measure(self, qubit: QubitId) -> Self {
        self.push(Gate::Measure(qubit))
    }

    /// Measure every qubit
    pub fn measure_all(self) -> Self {
        self.push(Gate::MeasureAll)
    }

    /// Barrier across all qubits
    pub fn barrier(self) -> Self {
        self.push(Gate::Barrier(Vec::new()))
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Finish building
    pub fn build(self) -> Circuit {
        self.circuit
    }

    /// Finish building, failing on the first gate that was rejected
    pub fn try_build(self) -> QrngResult<Circuit> {
        match self.rejected {
            Some(e) => Err(e),
            None => Ok(self.circuit),
        }
    }
}

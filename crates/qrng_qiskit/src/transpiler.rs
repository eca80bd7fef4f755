//! OpenQASM 3 emission for IBM backends
//!
//! Rewrites single-qubit gates into the IBM basis (`rz`, `sx`, `x`) and
//! measures into a `meas` register, the name `measure_all` uses in Qiskit,
//! so sampler results come back under `data.meas`.

use qrng_core::{ibm, Circuit, Gate};
use std::fmt::Write;
use thiserror::Error;

/// IBM native single-qubit gate set
pub const IBM_BASIS_GATES: &[&str] = &["id", "rz", "sx", "x"];

/// Transpilation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranspileError {
    /// Circuit wider than the target device
    #[error("Circuit requires {required} qubits, backend has {available}")]
    TooManyQubits {
        /// Qubits the circuit uses
        required: usize,
        /// Qubits on the device
        available: usize,
    },

    /// Circuit has no qubits
    #[error("Circuit has no qubits")]
    NoQubits,
}

/// Transpiler configuration
#[derive(Debug, Clone)]
pub struct TranspilerConfig {
    /// Number of qubits on target
    pub num_qubits: usize,

    /// Server-side optimization level (0-3)
    pub optimization_level: u8,

    /// Classical register name
    pub register: String,
}

impl Default for TranspilerConfig {
    fn default() -> Self {
        Self {
            num_qubits: 127,
            optimization_level: 1,
            register: ibm::MEASURE_REGISTER.to_string(),
        }
    }
}

impl TranspilerConfig {
    /// Config for a device with `num_qubits` qubits
    pub fn for_backend(num_qubits: usize) -> Self {
        Self {
            num_qubits,
            ..Default::default()
        }
    }

    /// Set optimization level (capped at 3)
    pub fn with_optimization_level(mut self, level: u8) -> Self {
        self.optimization_level = level.min(3);
        self
    }
}

/// Circuit transpiler for IBM backends
pub struct Transpiler {
    config: TranspilerConfig,
}

impl Transpiler {
    /// Create new transpiler
    pub fn new(config: TranspilerConfig) -> Self {
        Self { config }
    }

    /// Get config
    pub fn config(&self) -> &TranspilerConfig {
        &self.config
    }

    /// Number of classical bits the circuit produces.
    ///
    /// Circuits without a measurement are measured in full.
    pub fn register_width(circuit: &Circuit) -> usize {
        if circuit.has_measurement() {
            circuit.measured_qubits().len()
        } else {
            circuit.num_qubits()
        }
    }

    /// Emit OpenQASM 3.0
    ///
    /// Measured qubits map to register bits in ascending qubit order, so
    /// bit `i` of the result is the `i`-th lowest measured qubit.
    pub fn to_qasm3(&self, circuit: &Circuit) -> String {
        let n = circuit.num_qubits();
        let reg = &self.config.register;
        let measured = if circuit.has_measurement() {
            circuit.measured_qubits()
        } else {
            (0..n).collect()
        };
        let clbit = |q: usize| measured.binary_search(&q).unwrap_or(0);

        let mut qasm = String::new();
        let _ = writeln!(qasm, "OPENQASM 3.0;");
        let _ = writeln!(qasm, "include \"stdgates.inc\";");
        let _ = writeln!(qasm, "qubit[{}] q;", n);
        let _ = writeln!(qasm, "bit[{}] {};", measured.len(), reg);

        for gate in circuit.gates() {
            match gate {
                Gate::Measure(q) => {
                    let _ = writeln!(qasm, "{}[{}] = measure q[{}];", reg, clbit(*q), q);
                }
                Gate::MeasureAll => {
                    let _ = writeln!(qasm, "barrier q;");
                    for q in 0..n {
                        let _ = writeln!(qasm, "{}[{}] = measure q[{}];", reg, q, q);
                    }
                }
                Gate::Barrier(qs) if qs.is_empty() => {
                    let _ = writeln!(qasm, "barrier q;");
                }
                Gate::Barrier(qs) => {
                    let list: Vec<String> = qs.iter().map(|q| format!("q[{}]", q)).collect();
                    let _ = writeln!(qasm, "barrier {};", list.join(", "));
                }
                _ => {
                    if let Some(&q) = gate.qubits().first() {
                        for op in basis_ops(gate) {
                            let _ = writeln!(qasm, "{} q[{}];", op, q);
                        }
                    }
                }
            }
        }

        if !circuit.has_measurement() {
            for q in 0..n {
                let _ = writeln!(qasm, "{}[{}] = measure q[{}];", reg, q, q);
            }
        }

        qasm
    }

    /// Check the circuit fits the target
    pub fn validate(&self, circuit: &Circuit) -> Result<(), TranspileError> {
        if circuit.num_qubits() == 0 {
            return Err(TranspileError::NoQubits);
        }
        if circuit.num_qubits() > self.config.num_qubits {
            return Err(TranspileError::TooManyQubits {
                required: circuit.num_qubits(),
                available: self.config.num_qubits,
            });
        }
        Ok(())
    }
}

/// Basis-gate sequence for a single-qubit gate, in application order.
///
/// Equal to the input gate up to global phase.
fn basis_ops(gate: &Gate) -> Vec<String> {
    let rz = |angle: String| format!("rz({})", angle);
    match gate {
        Gate::H(_) => vec![rz("pi/2".into()), "sx".into(), rz("pi/2".into())],
        Gate::X(_) => vec!["x".into()],
        Gate::Y(_) => vec![rz("pi".into()), "x".into()],
        Gate::Z(_) => vec![rz("pi".into())],
        Gate::S(_) => vec![rz("pi/2".into())],
        Gate::Sdg(_) => vec![rz("-pi/2".into())],
        Gate::Sx(_) => vec!["sx".into()],
        Gate::Rx(_, theta) => vec![
            rz("pi/2".into()),
            "sx".into(),
            rz(format!("{} + pi", theta)),
            "sx".into(),
            rz("pi/2".into()),
        ],
        Gate::Ry(_, theta) => vec![
            "sx".into(),
            rz(format!("{} + pi", theta)),
            "sx".into(),
            rz("pi".into()),
        ],
        Gate::Rz(_, theta) => vec![rz(theta.to_string())],
        Gate::Measure(_) | Gate::MeasureAll | Gate::Barrier(_) => Vec::new(),
    }
}

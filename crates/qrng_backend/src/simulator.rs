//! Local simulator backend for QRNG
//!
//! The circuit model only has single-qubit gates, so the state is always a
//! product state. Each qubit is tracked as its own 2-amplitude vector,
//! which keeps the cost linear in the qubit count (256 qubits is cheap).

use crate::execution::{Backend, ExecutionMetadata, ExecutionResult};
use num_complex::Complex64;
use qrng_core::{bits, Bitstring, Circuit, Counts, Gate, QrngError, QrngResult};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::f64::consts::FRAC_1_SQRT_2;

/// Single-qubit state `a|0> + b|1>`
type QubitState = [Complex64; 2];

const GROUND: QubitState = [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)];

/// Product-state simulator backend
pub struct SimulatorBackend {
    /// Backend name
    name: String,

    /// Number of qubits
    num_qubits: usize,

    /// Random seed
    seed: Option<u64>,
}

impl SimulatorBackend {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create new simulator backend
    pub fn new(num_qubits: usize) -> Self {
        Self {
            name: "qrng_simulator".to_string(),
            num_qubits,
            seed: None,
        }
    }

    /// Simulator wide enough for the largest bit request
    pub fn max_width() -> Self {
        Self::new(bits::MAX)
    }

    /// Set seed for reproducibility
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set seed if one is given
    pub fn with_optional_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Set backend name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    // ========================================================================
    // Simulation
    // ========================================================================

    /// Simulate a single shot and return the classical register
    fn simulate_single_shot(&self, circuit: &Circuit, rng: &mut ChaCha8Rng) -> Bitstring {
        let n = circuit.num_qubits();
        let mut state = vec![GROUND; n];
        let mut clbits: Vec<Option<bool>> = vec![None; n];

        for gate in circuit.gates() {
            match gate {
                Gate::Measure(q) => clbits[*q] = Some(measure(&mut state[*q], rng)),
                Gate::MeasureAll => {
                    for (q, qs) in state.iter_mut().enumerate() {
                        clbits[q] = Some(measure(qs, rng));
                    }
                }
                Gate::Barrier(_) => {}
                _ => {
                    if let Some(&q) = gate.qubits().first() {
                        apply_gate(&mut state[q], gate);
                    }
                }
            }
        }

        if !circuit.has_measurement() {
            for (q, qs) in state.iter_mut().enumerate() {
                clbits[q] = Some(measure(qs, rng));
            }
        }

        let outcomes: Vec<bool> = clbits.into_iter().flatten().collect();
        Bitstring::from_qubit_outcomes(&outcomes)
    }
}

// ============================================================================
// Gate Application
// ============================================================================

fn apply_gate(state: &mut QubitState, gate: &Gate) {
    let [a, b] = *state;
    let i = Complex64::i();

    *state = match gate {
        Gate::H(_) => [(a + b) * FRAC_1_SQRT_2, (a - b) * FRAC_1_SQRT_2],
        Gate::X(_) => [b, a],
        Gate::Y(_) => [-i * b, i * a],
        Gate::Z(_) => [a, -b],
        Gate::S(_) => [a, i * b],
        Gate::Sdg(_) => [a, -i * b],
        Gate::Sx(_) => {
            let p = Complex64::new(0.5, 0.5);
            let m = Complex64::new(0.5, -0.5);
            [p * a + m * b, m * a + p * b]
        }
        Gate::Rx(_, angle) => {
            let c = (angle / 2.0).cos();
            let s = Complex64::new(0.0, -(angle / 2.0).sin());
            [a * c + b * s, a * s + b * c]
        }
        Gate::Ry(_, angle) => {
            let c = (angle / 2.0).cos();
            let s = (angle / 2.0).sin();
            [a * c - b * s, a * s + b * c]
        }
        Gate::Rz(_, angle) => [
            a * Complex64::from_polar(1.0, -angle / 2.0),
            b * Complex64::from_polar(1.0, angle / 2.0),
        ],
        Gate::Measure(_) | Gate::MeasureAll | Gate::Barrier(_) => [a, b],
    };
}

/// Projective measurement; collapses the qubit onto the outcome
fn measure(state: &mut QubitState, rng: &mut ChaCha8Rng) -> bool {
    let p0 = state[0].norm_sqr();
    let p1 = state[1].norm_sqr();
    let total = p0 + p1;
    let outcome = rng.gen::<f64>() * total >= p0;

    *state = if outcome {
        [Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)]
    } else {
        GROUND
    };
    outcome
}

impl Backend for SimulatorBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    fn execute(&self, circuit: &Circuit, shots: u64) -> QrngResult<ExecutionResult> {
        if circuit.num_qubits() > self.num_qubits {
            return Err(QrngError::QubitOutOfRange {
                qubit: circuit.num_qubits(),
                max: self.num_qubits,
            });
        }
        if shots == 0 || shots > self.max_shots() {
            return Err(QrngError::ShotsOutOfRange(shots, 1, self.max_shots()));
        }

        let mut rng = match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        log::debug!(
            "Simulating {}-qubit circuit for {} shot(s) on {}",
            circuit.num_qubits(),
            shots,
            self.name
        );

        let mut counts: Counts = HashMap::new();
        let mut memory = Vec::with_capacity(shots as usize);
        for _ in 0..shots {
            let bitstring = self.simulate_single_shot(circuit, &mut rng).to_string();
            *counts.entry(bitstring.clone()).or_insert(0) += 1;
            memory.push(bitstring);
        }

        Ok(ExecutionResult {
            counts,
            memory,
            shots,
            metadata: ExecutionMetadata {
                backend: self.name.clone(),
                simulated: true,
                seed: self.seed,
                ..Default::default()
            },
        })
    }

    fn is_simulator(&self) -> bool {
        true
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Backend execution types and traits
//!
//! Defines the interface every backend (local or remote) implements.

use qrng_core::{Bitstring, Circuit, Counts, QrngResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Result of circuit execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Measurement counts (bitstring -> count)
    pub counts: Counts,

    /// Per-shot outcomes in execution order (may be empty when the
    /// backend only reports counts)
    #[serde(default)]
    pub memory: Vec<String>,

    /// Number of shots executed
    pub shots: u64,

    /// Execution metadata
    pub metadata: ExecutionMetadata,
}

/// Execution metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    /// Backend name
    pub backend: String,

    /// Job ID (if applicable)
    pub job_id: Option<String>,

    /// Execution time in milliseconds
    pub execution_time_ms: Option<u64>,

    /// Whether simulation was used
    pub simulated: bool,

    /// Seed used (if any)
    pub seed: Option<u64>,

    /// Additional info
    pub extra: HashMap<String, String>,
}

impl ExecutionResult {
    /// Create new execution result from counts
    pub fn new(counts: Counts, shots: u64, backend: &str) -> Self {
        Self {
            counts,
            memory: Vec::new(),
            shots,
            metadata: ExecutionMetadata {
                backend: backend.to_string(),
                simulated: true,
                ..Default::default()
            },
        }
    }

    /// Create from per-shot outcomes; counts are derived from them
    pub fn from_memory(memory: Vec<String>, backend: &str) -> Self {
        let mut counts: Counts = HashMap::new();
        for bs in &memory {
            *counts.entry(bs.clone()).or_insert(0) += 1;
        }
        let shots = memory.len() as u64;
        Self {
            counts,
            memory,
            shots,
            metadata: ExecutionMetadata {
                backend: backend.to_string(),
                ..Default::default()
            },
        }
    }

    /// Get total count (should equal shots)
    pub fn total_counts(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Get probability of a specific bitstring
    pub fn probability(&self, bitstring: &str) -> f64 {
        if self.shots == 0 {
            return 0.0;
        }
        let count = self.counts.get(bitstring).copied().unwrap_or(0);
        count as f64 / self.shots as f64
    }

    /// Get most frequent bitstring
    pub fn most_frequent(&self) -> Option<(&String, u64)> {
        self.counts
            .iter()
            .max_by_key(|(_, &count)| count)
            .map(|(bs, &count)| (bs, count))
    }

    /// Outcome of the first shot.
    ///
    /// Uses `memory` when present, otherwise the first key of `counts`
    /// (with a single shot there is only one). `None` when the result
    /// holds no parsable outcome.
    pub fn first_bitstring(&self) -> Option<Bitstring> {
        let raw = match self.memory.first() {
            Some(bs) => bs,
            None => self.most_frequent()?.0,
        };
        Bitstring::parse(raw).ok().filter(|b| !b.is_empty())
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExecutionResult(backend={}, shots={}, unique={})",
            self.metadata.backend,
            self.shots,
            self.counts.len()
        )
    }
}

/// Quantum backend trait
pub trait Backend: Send + Sync {
    /// Get backend name
    fn name(&self) -> &str;

    /// Get number of qubits
    fn num_qubits(&self) -> usize;

    /// Execute a circuit
    fn execute(&self, circuit: &Circuit, shots: u64) -> QrngResult<ExecutionResult>;

    /// Execute multiple circuits (batch)
    fn execute_batch(&self, circuits: &[Circuit], shots: u64) -> QrngResult<Vec<ExecutionResult>> {
        circuits.iter().map(|c| self.execute(c, shots)).collect()
    }

    /// Check if backend is simulator
    fn is_simulator(&self) -> bool {
        true
    }

    /// Get maximum shots per execution
    fn max_shots(&self) -> u64 {
        100_000
    }
}

// ============================================================================
// Tests
// ============================================================================

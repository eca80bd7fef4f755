//! Bit statistics for generated bitstrings
//!
//! Zero/one distribution, the ones-ratio balance check, per-bit Shannon
//! entropy and the longest run of identical bits.

use crate::constants::entropy::{BALANCE_LOWER, BALANCE_UPPER};
use crate::types::Bitstring;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Summary statistics of a single bitstring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitStatistics {
    /// Number of bits
    pub len: usize,

    /// Number of zeros
    pub zeros: usize,

    /// Number of ones
    pub ones: usize,

    /// ones / len (0 for an empty bitstring)
    pub ones_ratio: f64,

    /// Shannon entropy of the bit distribution, in bits per symbol (0..=1)
    pub shannon_entropy: f64,

    /// Length of the longest run of identical bits
    pub longest_run: usize,
}

impl BitStatistics {
    /// Compute statistics for a bitstring
    pub fn from_bitstring(bits: &Bitstring) -> Self {
        let len = bits.len();
        let ones = bits.count_ones();
        let zeros = len - ones;
        let ones_ratio = if len == 0 {
            0.0
        } else {
            ones as f64 / len as f64
        };

        Self {
            len,
            zeros,
            ones,
            ones_ratio,
            shannon_entropy: binary_entropy(ones_ratio),
            longest_run: longest_run(bits.bits()),
        }
    }

    /// Balance check: the fraction of ones lies strictly inside (0.4, 0.6)
    pub fn passes_balance_test(&self) -> bool {
        self.ones_ratio > BALANCE_LOWER && self.ones_ratio < BALANCE_UPPER
    }
}

impl fmt::Display for BitStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BitStatistics(len={}, zeros={}, ones={}, ratio={:.4}, H={:.4})",
            self.len, self.zeros, self.ones, self.ones_ratio, self.shannon_entropy
        )
    }
}

/// H(p) = -p log2 p - (1-p) log2 (1-p)
fn binary_entropy(p: f64) -> f64 {
    if p <= 0.0 || p >= 1.0 {
        return 0.0;
    }
    -(p * p.log2() + (1.0 - p) * (1.0 - p).log2())
}

fn longest_run(bits: &[bool]) -> usize {
    let mut best = 0;
    let mut current = 0;
    let mut prev = None;
    for &b in bits {
        if prev == Some(b) {
            current += 1;
        } else {
            current = 1;
            prev = Some(b);
        }
        best = best.max(current);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn stats(s: &str) -> BitStatistics {
        BitStatistics::from_bitstring(&Bitstring::parse(s).unwrap())
    }

    #[test]
    fn test_distribution() {
        let s = stats("01101000");
        assert_eq!(s.len, 8);
        assert_eq!(s.ones, 3);
        assert_eq!(s.zeros, 5);
        assert_relative_eq!(s.ones_ratio, 0.375);
    }

    #[test]
    fn test_balance_bounds_are_exclusive() {
        // 4/10 and 6/10 sit exactly on the bounds
        assert!(!stats("1111000000").passes_balance_test());
        assert!(!stats("1111110000").passes_balance_test());
        assert!(stats("1111100000").passes_balance_test());
    }

    #[test]
    fn test_balance_extremes() {
        assert!(!stats("00000000").passes_balance_test());
        assert!(!stats("11111111").passes_balance_test());
        assert!(stats("10101010").passes_balance_test());
    }

    #[test]
    fn test_entropy() {
        assert_relative_eq!(stats("10101010").shannon_entropy, 1.0);
        assert_relative_eq!(stats("00000000").shannon_entropy, 0.0);
        let h = stats("10000000").shannon_entropy;
        assert!(h > 0.5 && h < 0.6, "H = {}", h);
    }

    #[test]
    fn test_longest_run() {
        assert_eq!(stats("10101010").longest_run, 1);
        assert_eq!(stats("10011100").longest_run, 3);
        assert_eq!(stats("11111111").longest_run, 8);
    }

    #[test]
    fn test_empty() {
        let s = BitStatistics::from_bitstring(&Bitstring::new(vec![]));
        assert_eq!(s.len, 0);
        assert_eq!(s.longest_run, 0);
        assert!(!s.passes_balance_test());
    }
}

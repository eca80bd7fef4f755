//! Core types for QRNG
//!
//! Type aliases and the `Bitstring` measurement outcome.

use crate::error::{QrngError, QrngResult};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// Qubit identifier (0-indexed)
pub type QubitId = usize;

/// Rotation angle in radians
pub type Angle = f64;

/// Measurement counts: bitstring -> count
pub type Counts = HashMap<String, u64>;

// ============================================================================
// Bitstring
// ============================================================================

/// Measurement outcome, one bit per measured qubit.
///
/// Bits are stored in display order: the first character is the
/// highest-numbered qubit and the last character is qubit 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Bitstring {
    bits: Vec<bool>,
}

impl Bitstring {
    /// Create from bits in display order
    pub fn new(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// Create from per-qubit outcomes where `outcomes[q]` is qubit `q`
    pub fn from_qubit_outcomes(outcomes: &[bool]) -> Self {
        Self {
            bits: outcomes.iter().rev().copied().collect(),
        }
    }

    /// Parse from a string such as `"0110"`.
    ///
    /// Spaces separating classical registers are ignored.
    pub fn parse(s: &str) -> QrngResult<Self> {
        let bits: Result<Vec<bool>, _> = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                _ => Err(QrngError::InvalidBitstring(s.to_string())),
            })
            .collect();
        Ok(Self { bits: bits? })
    }

    /// Create zero bitstring of given length
    pub fn zeros(n: usize) -> Self {
        Self {
            bits: vec![false; n],
        }
    }

    /// Get the number of bits
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Count number of 1s
    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Count number of 0s
    pub fn count_zeros(&self) -> usize {
        self.len() - self.count_ones()
    }

    /// Bits in display order
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Outcome of qubit `q` (qubit 0 is the last character)
    pub fn qubit(&self, q: QubitId) -> Option<bool> {
        let n = self.bits.len();
        if q >= n {
            return None;
        }
        Some(self.bits[n - 1 - q])
    }

    /// Interpret as an unsigned big-endian binary number
    pub fn to_biguint(&self) -> BigUint {
        let mut bytes = Vec::with_capacity(self.bits.len().div_ceil(8));
        let pad = (8 - self.bits.len() % 8) % 8;
        let mut acc = 0u8;
        let mut filled = pad;
        for &b in &self.bits {
            acc = (acc << 1) | u8::from(b);
            filled += 1;
            if filled == 8 {
                bytes.push(acc);
                acc = 0;
                filled = 0;
            }
        }
        BigUint::from_bytes_be(&bytes)
    }

    /// Decimal rendering of the value, for any width
    pub fn to_decimal_string(&self) -> String {
        self.to_biguint().to_str_radix(10)
    }

    /// Left-pad with zeros (or keep the low `width` bits) to exactly `width` bits
    pub fn resized(&self, width: usize) -> Self {
        let n = self.bits.len();
        if n == width {
            return self.clone();
        }
        if n > width {
            return Self {
                bits: self.bits[n - width..].to_vec(),
            };
        }
        let mut bits = vec![false; width - n];
        bits.extend_from_slice(&self.bits);
        Self { bits }
    }
}

impl fmt::Display for Bitstring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.bits {
            write!(f, "{}", if b { '1' } else { '0' })?;
        }
        Ok(())
    }
}

impl FromStr for Bitstring {
    type Err = QrngError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Bitstring {
    type Error = QrngError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Bitstring> for String {
    fn from(b: Bitstring) -> Self {
        b.to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Constants for QRNG
//!
//! Bit-count limits, balance thresholds and IBM Quantum defaults.

// ============================================================================
// Bit Counts
// ============================================================================

pub mod bits {
    //! Limits on how many random bits a single request may ask for

    use num_bigint::BigInt;

    /// Fewest bits a request may produce
    pub const MIN: usize = 8;

    /// Most bits a request may produce
    pub const MAX: usize = 256;

    /// Width used when the requested width cannot be parsed
    pub const DEFAULT: usize = 8;

    /// Clamp a requested width into `[MIN, MAX]`
    #[inline]
    pub fn clamp(n: usize) -> usize {
        n.clamp(MIN, MAX)
    }

    /// Parse a requested width as an integer of any size and clamp it.
    ///
    /// Accepts surrounding whitespace and a leading sign; anything else
    /// that is not an integer gives `None`.
    pub fn parse_request(input: &str) -> Option<usize> {
        let value: BigInt = input.trim().parse().ok()?;
        if value <= BigInt::from(MIN) {
            Some(MIN)
        } else if value >= BigInt::from(MAX) {
            Some(MAX)
        } else {
            usize::try_from(&value).ok()
        }
    }
}

// ============================================================================
// Entropy Thresholds
// ============================================================================

pub mod entropy {
    //! Thresholds for the ones-ratio balance check

    /// Lower bound (exclusive) on the fraction of ones
    pub const BALANCE_LOWER: f64 = 0.4;

    /// Upper bound (exclusive) on the fraction of ones
    pub const BALANCE_UPPER: f64 = 0.6;
}

// ============================================================================
// IBM Quantum Defaults
// ============================================================================

pub mod ibm {
    //! Defaults for talking to IBM Quantum

    /// Backend tried first before scanning the full backend list
    pub const PREFERRED_BACKEND: &str = "ibm_sherbrooke";

    /// Service instance used when none is configured
    pub const DEFAULT_INSTANCE: &str = "Quantum_rng";

    /// Web dashboard prefix for following a job
    pub const JOB_MONITOR_URL: &str = "https://quantum.ibm.com/jobs/";

    /// A single shot yields one bitstring
    pub const DEFAULT_SHOTS: u64 = 1;

    /// Seconds to wait for a job before giving up
    pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 600;

    /// Classical register name used by `measure_all`
    pub const MEASURE_REGISTER: &str = "meas";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(bits::clamp(0), 8);
        assert_eq!(bits::clamp(8), 8);
        assert_eq!(bits::clamp(100), 100);
        assert_eq!(bits::clamp(256), 256);
        assert_eq!(bits::clamp(10_000), 256);
    }

    #[test]
    fn test_parse_request() {
        assert_eq!(bits::parse_request("32"), Some(32));
        assert_eq!(bits::parse_request("  +64\n"), Some(64));
        assert_eq!(bits::parse_request("3"), Some(8));
        assert_eq!(bits::parse_request("-7"), Some(8));
        assert_eq!(bits::parse_request("99999999999999999999"), Some(256));
        assert_eq!(bits::parse_request("-99999999999999999999"), Some(8));
        assert_eq!(bits::parse_request("abc"), None);
        assert_eq!(bits::parse_request("12.5"), None);
        assert_eq!(bits::parse_request(""), None);
    }

    #[test]
    fn test_balance_window() {
        assert!(entropy::BALANCE_LOWER < 0.5);
        assert!(entropy::BALANCE_UPPER > 0.5);
    }
}

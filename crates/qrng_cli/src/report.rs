//! Generation reporting

use crate::generator::{Generation, Source};
use qrng_core::BitStatistics;
use serde::Serialize;
use std::fmt::Write;

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Plain text
    Text,
    /// JSON
    Json,
}

/// Everything printed about one generation
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub bits: String,
    pub decimal: String,
    pub source: Source,
    pub elapsed_secs: f64,
    pub statistics: BitStatistics,
    pub entropy_test: bool,
}

impl Report {
    /// Build from a finished generation
    pub fn new(generation: &Generation) -> Self {
        let statistics = BitStatistics::from_bitstring(&generation.bits);
        Self {
            bits: generation.bits.to_string(),
            decimal: generation.bits.to_decimal_string(),
            source: generation.source.clone(),
            elapsed_secs: generation.elapsed.as_secs_f64(),
            entropy_test: statistics.passes_balance_test(),
            statistics,
        }
    }

    /// Render in the given format
    pub fn render(&self, format: ReportFormat) -> String {
        match format {
            ReportFormat::Text => self.to_text(),
            ReportFormat::Json => self.to_json(),
        }
    }

    /// Plain text
    pub fn to_text(&self) -> String {
        let stats = &self.statistics;
        let mut output = String::new();

        let _ = writeln!(output, "\nRandom bits: {}", self.bits);
        let _ = writeln!(output, "Decimal value: {}", self.decimal);
        let _ = writeln!(output, "Source: {}", source_label(&self.source));

        let _ = writeln!(output, "\nQuantum properties:");
        let _ = writeln!(
            output,
            "Bit distribution: {} zeros, {} ones",
            stats.zeros, stats.ones
        );
        let _ = writeln!(
            output,
            "Entropy test: {}",
            if self.entropy_test { "Pass" } else { "Fail" }
        );
        let _ = writeln!(
            output,
            "Shannon entropy: {:.4} bits/bit",
            stats.shannon_entropy
        );
        let _ = writeln!(output, "Longest run: {}", stats.longest_run);

        output
    }

    /// Pretty JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

fn source_label(source: &Source) -> String {
    match source {
        Source::Hardware { backend, job_id } => format!("{} (job {})", backend, job_id),
        Source::Simulator => "local simulator".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use qrng_core::Bitstring;
    use std::time::Duration;

    fn generation(bits: &str, source: Source) -> Generation {
        Generation {
            bits: Bitstring::parse(bits).unwrap(),
            source,
            elapsed: Duration::from_millis(1250),
        }
    }

    #[test]
    fn test_text_report() {
        let report = Report::new(&generation("10110010", Source::Simulator));
        let text = report.render(ReportFormat::Text);

        assert!(text.contains("Random bits: 10110010"));
        assert!(text.contains("Decimal value: 178"));
        assert!(text.contains("Bit distribution: 4 zeros, 4 ones"));
        assert!(text.contains("Entropy test: Pass"));
        assert!(text.contains("Source: local simulator"));
    }

    #[test]
    fn test_entropy_test_fail() {
        let report = Report::new(&generation("11111110", Source::Simulator));
        assert!(!report.entropy_test);
        assert!(report.to_text().contains("Entropy test: Fail"));
    }

    #[test]
    fn test_wide_decimal() {
        let bits = "1".repeat(256);
        let report = Report::new(&generation(&bits, Source::Simulator));
        assert_eq!(
            report.decimal,
            "115792089237316195423570985008687907853269984665640564039457584007913129639935"
        );
    }

    #[test]
    fn test_json_report() {
        let source = Source::Hardware {
            backend: "ibm_sherbrooke".into(),
            job_id: "d1abc".into(),
        };
        let report = Report::new(&generation("00000011", source));
        let value: serde_json::Value = serde_json::from_str(&report.to_json()).unwrap();

        assert_eq!(value["bits"], "00000011");
        assert_eq!(value["decimal"], "3");
        assert_eq!(value["source"]["backend"], "ibm_sherbrooke");
        assert_eq!(value["statistics"]["ones"], 2);
        assert_eq!(value["entropy_test"], false);
        assert_relative_eq!(value["elapsed_secs"].as_f64().unwrap(), 1.25);
    }
}

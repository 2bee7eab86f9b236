use crate::validator::{Finding, LegacyDiscrepancy, ValidationReport};
use itertools::Itertools;

/// Formats validation reports into human-readable text.
pub struct ReportFormatter;

impl ReportFormatter {
    /// One line per finding, errors before warnings, followed by a summary line.
    pub fn format(report: &ValidationReport) -> String {
        report
            .findings()
            .map(Self::format_finding)
            .chain(std::iter::once(Self::summary(report)))
            .join("\n")
    }

    pub fn format_finding(finding: &Finding) -> String {
        format!("{}: {}", finding.severity, finding)
    }

    /// `valid`, `valid (1 warning)` or `invalid: 2 errors, 1 warning`.
    pub fn summary(report: &ValidationReport) -> String {
        let warnings = Self::plural(report.warnings.len(), "warning");
        if report.valid {
            if report.warnings.is_empty() {
                "valid".to_string()
            } else {
                format!("valid ({})", warnings)
            }
        } else {
            format!(
                "invalid: {}, {}",
                Self::plural(report.errors.len(), "error"),
                warnings
            )
        }
    }

    pub fn format_discrepancies(found: &[LegacyDiscrepancy]) -> String {
        if found.is_empty() {
            return "legacy table agrees with the registry".to_string();
        }
        found.iter().map(|d| format!("- {}", d)).join("\n")
    }

    fn plural(count: usize, noun: &str) -> String {
        if count == 1 {
            format!("1 {}", noun)
        } else {
            format!("{} {}s", count, noun)
        }
    }
}

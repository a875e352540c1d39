//! Threshold validation of located sections.

use tracing::warn;

use crate::domain::{FilingError, Result, SectionFailure, SectionKey, SectionMatch, ValidationFailure};

/// Minimum content length of a valid section, in characters.
pub const MIN_SECTION_CHARS: usize = 500;

/// Outcome of checking every required section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub checked: Vec<String>,
    pub failures: Vec<SectionFailure>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// The composite failure, if any section failed.
    pub fn failure(&self) -> Option<ValidationFailure> {
        if self.passed() {
            None
        } else {
            Some(ValidationFailure {
                failures: self.failures.clone(),
            })
        }
    }
}

/// How a validation failure is surfaced.
#[derive(Debug, Clone, PartialEq)]
pub enum Escalation {
    Passed,
    /// Soft failure: the composite message, to be recorded as a warning.
    Warning(String),
}

/// Checks required sections against confidence and length thresholds.
#[derive(Debug, Clone)]
pub struct SectionValidator {
    min_chars: usize,
}

impl Default for SectionValidator {
    fn default() -> Self {
        Self {
            min_chars: MIN_SECTION_CHARS,
        }
    }
}

impl SectionValidator {
    pub fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }

    pub fn min_chars(&self) -> usize {
        self.min_chars
    }

    /// Check every required key; failures are collected, never short-circuited.
    pub fn check(&self, sections: &[SectionMatch], required: &[String], threshold: f64) -> ValidationReport {
        let mut report = ValidationReport::default();

        for raw in required {
            report.checked.push(raw.clone());
            let Some(key) = SectionKey::resolve(raw) else {
                report.failures.push(SectionFailure::UnknownSection { key: raw.clone() });
                continue;
            };
            let name = key.as_str().to_string();

            let found = sections.iter().find(|s| s.key == key && s.found);
            let Some(section) = found else {
                report.failures.push(SectionFailure::NotFound { key: name });
                continue;
            };

            if section.confidence < threshold {
                report.failures.push(SectionFailure::LowConfidence {
                    key: name.clone(),
                    observed: section.confidence,
                    threshold,
                });
            }
            if section.length_chars < self.min_chars {
                report.failures.push(SectionFailure::TooShort {
                    key: name,
                    length: section.length_chars,
                    minimum: self.min_chars,
                });
            }
        }

        report
    }

    /// Check and escalate: an error when `hard_fail`, a warning otherwise.
    pub fn enforce(
        &self,
        sections: &[SectionMatch],
        required: &[String],
        threshold: f64,
        hard_fail: bool,
    ) -> Result<Escalation> {
        let report = self.check(sections, required, threshold);
        match report.failure() {
            None => Ok(Escalation::Passed),
            Some(failure) if hard_fail => Err(FilingError::Validation(failure)),
            Some(failure) => {
                let message = failure.to_string();
                warn!(failures = failure.failures.len(), "{}", message);
                Ok(Escalation::Warning(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(key: SectionKey, confidence: f64, len: usize) -> SectionMatch {
        SectionMatch::found(key, confidence, 0, len, "a".repeat(len))
    }

    fn all_keys() -> Vec<String> {
        SectionKey::ALL.iter().map(|k| k.as_str().to_string()).collect()
    }

    #[test]
    fn test_all_sections_pass() {
        let sections: Vec<_> = SectionKey::ALL
            .iter()
            .map(|k| section(*k, 0.95, 800))
            .collect();
        let report = SectionValidator::default().check(&sections, &all_keys(), 0.75);
        assert!(report.passed());
        assert_eq!(report.checked.len(), 3);
    }

    #[test]
    fn test_short_section_fails_regardless_of_confidence() {
        let sections = vec![section(SectionKey::Mdna, 1.0, 499)];
        let report = SectionValidator::default().check(&sections, &["mdna".to_string()], 0.0);
        assert_eq!(
            report.failures,
            vec![SectionFailure::TooShort {
                key: "mdna".to_string(),
                length: 499,
                minimum: 500,
            }]
        );
    }

    #[test]
    fn test_low_confidence_fails_regardless_of_length() {
        let sections = vec![section(SectionKey::RiskFactors, 0.6, 50_000)];
        let report =
            SectionValidator::default().check(&sections, &["item 1a".to_string()], 0.75);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            report.failures[0],
            SectionFailure::LowConfidence { .. }
        ));
    }

    #[test]
    fn test_multiple_failures_reported_together() {
        let sections = vec![
            section(SectionKey::RiskFactors, 0.6, 100),
            SectionMatch::not_found(SectionKey::Mdna),
            section(SectionKey::FinancialStatements, 0.95, 900),
        ];
        let report = SectionValidator::default().check(&sections, &all_keys(), 0.75);
        assert_eq!(report.failures.len(), 3);
        let message = report.failure().expect("failure").to_string();
        assert!(message.contains("risk_factors: confidence 0.60"));
        assert!(message.contains("risk_factors: content length 100"));
        assert!(message.contains("mdna: not found"));
        assert!(!message.contains("financial_statements"));
    }

    #[test]
    fn test_unknown_key_fails() {
        let report = SectionValidator::default().check(&[], &["exhibits".to_string()], 0.5);
        assert_eq!(
            report.failures,
            vec![SectionFailure::UnknownSection {
                key: "exhibits".to_string()
            }]
        );
    }

    #[test]
    fn test_enforce_escalation() {
        let sections = vec![SectionMatch::not_found(SectionKey::Mdna)];
        let required = vec!["mdna".to_string()];
        let validator = SectionValidator::default();

        let err = validator
            .enforce(&sections, &required, 0.5, true)
            .expect_err("hard fail");
        assert!(err.is_validation());
        assert!(err.to_string().contains("mdna: not found"));

        let soft = validator
            .enforce(&sections, &required, 0.5, false)
            .expect("soft fail");
        assert_eq!(
            soft,
            Escalation::Warning("section validation failed: mdna: not found".to_string())
        );
    }
}

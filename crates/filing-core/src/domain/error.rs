//! Domain-level error taxonomy for filing analysis.

use crate::domain::step::StepName;

/// One reason a required section did not pass validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SectionFailure {
    #[error("{key}: unknown section key")]
    UnknownSection { key: String },

    #[error("{key}: not found")]
    NotFound { key: String },

    #[error("{key}: confidence {observed:.2} below threshold {threshold:.2}")]
    LowConfidence {
        key: String,
        observed: f64,
        threshold: f64,
    },

    #[error("{key}: content length {length} below minimum {minimum} chars")]
    TooShort {
        key: String,
        length: usize,
        minimum: usize,
    },
}

impl SectionFailure {
    /// The requested key this failure refers to.
    pub fn key(&self) -> &str {
        match self {
            SectionFailure::UnknownSection { key }
            | SectionFailure::NotFound { key }
            | SectionFailure::LowConfidence { key, .. }
            | SectionFailure::TooShort { key, .. } => key,
        }
    }
}

/// Composite validation failure: every failing section, reported together.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure {
    pub failures: Vec<SectionFailure>,
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "section validation failed: ")?;
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}

/// Filing workflow errors.
#[derive(Debug, thiserror::Error)]
pub enum FilingError {
    #[error("input error: {0}")]
    Input(String),

    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error("step '{step}' failed: {message}")]
    Step { step: StepName, message: String },

    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("extraction error: {0}")]
    Extraction(String),

    #[error("invalid section pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl FilingError {
    /// Whether this error came out of section validation.
    pub fn is_validation(&self) -> bool {
        matches!(self, FilingError::Validation(_))
    }
}

/// Result type for filing operations.
pub type Result<T> = std::result::Result<T, FilingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_message_lists_each_failure() {
        let failure = ValidationFailure {
            failures: vec![
                SectionFailure::NotFound {
                    key: "mdna".to_string(),
                },
                SectionFailure::TooShort {
                    key: "risk_factors".to_string(),
                    length: 120,
                    minimum: 500,
                },
            ],
        };
        let msg = failure.to_string();
        assert!(msg.starts_with("section validation failed: "));
        assert!(msg.contains("mdna: not found"));
        assert!(msg.contains("risk_factors: content length 120 below minimum 500"));
        assert_eq!(msg.matches(';').count(), 1);
    }

    #[test]
    fn test_low_confidence_formats_two_decimals() {
        let failure = SectionFailure::LowConfidence {
            key: "financial_statements".to_string(),
            observed: 0.6,
            threshold: 0.75,
        };
        assert_eq!(
            failure.to_string(),
            "financial_statements: confidence 0.60 below threshold 0.75"
        );
        assert_eq!(failure.key(), "financial_statements");
    }

    #[test]
    fn test_step_error_display() {
        let err = FilingError::Step {
            step: StepName::Extract,
            message: "no text extractor configured".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "step 'extract' failed: no text extractor configured"
        );
        assert!(!err.is_validation());
    }
}

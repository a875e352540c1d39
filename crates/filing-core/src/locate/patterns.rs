//! Heading patterns for the tracked sections.

use regex::Regex;

use crate::domain::{Result, SectionKey};

/// Confidence assigned when the first (canonical wording) pattern matches.
pub const CANONICAL_CONFIDENCE: f64 = 0.95;

/// Confidence assigned when only a looser fallback pattern matches.
pub const FALLBACK_CONFIDENCE: f64 = 0.6;

/// Generic "next numbered item" heading that closes a section.
pub const BOUNDARY_HEADING: &str = r"(?i)^\W*(?:item\s*\d{1,2}[a-z]?\b|part\s+[ivx]+\b)";

/// Ordered heading regexes for one section, strictest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSpec {
    pub key: SectionKey,
    pub headings: Vec<String>,
}

impl PatternSpec {
    pub fn new(key: SectionKey, headings: &[&str]) -> Self {
        Self {
            key,
            headings: headings.iter().map(|h| h.to_string()).collect(),
        }
    }
}

/// Default heading patterns for annual-report style filings.
pub fn default_pattern_specs() -> Vec<PatternSpec> {
    vec![
        PatternSpec::new(
            SectionKey::RiskFactors,
            &[
                r"(?i)^\W*item\s*1a\s*[.:\-–—]?\s*risk\s+factors\b",
                r"(?i)^\W*item\s*1a\b",
                r"(?i)^\W*risk\s+factors\W*$",
            ],
        ),
        PatternSpec::new(
            SectionKey::Mdna,
            &[
                r"(?i)^\W*item\s*7\s*[.:\-–—]?\s*management['’`]?s?\s+discussion\s+and\s+analysis\b",
                r"(?i)^\W*item\s*7\b",
                r"(?i)^\W*management['’`]?s?\s+discussion\s+and\s+analysis(?:\s+of\s+financial\s+condition\s+and\s+results\s+of\s+operations)?\W*$",
            ],
        ),
        PatternSpec::new(
            SectionKey::FinancialStatements,
            &[
                r"(?i)^\W*item\s*8\s*[.:\-–—]?\s*(?:consolidated\s+)?financial\s+statements\b",
                r"(?i)^\W*item\s*8\b",
                r"(?i)^\W*(?:consolidated\s+)?financial\s+statements(?:\s+and\s+supplementary\s+data)?\W*$",
            ],
        ),
    ]
}

/// Compiled heading patterns for one section.
#[derive(Debug, Clone)]
pub struct SectionPattern {
    pub key: SectionKey,
    tiers: Vec<Regex>,
}

impl SectionPattern {
    pub fn compile(spec: &PatternSpec) -> Result<Self> {
        let tiers = spec
            .headings
            .iter()
            .map(|h| Regex::new(h))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            key: spec.key,
            tiers,
        })
    }

    /// Index of the first pattern matching `heading`, if any.
    pub fn tier_of(&self, heading: &str) -> Option<usize> {
        self.tiers.iter().position(|re| re.is_match(heading))
    }

    pub fn confidence_for(tier: usize) -> f64 {
        if tier == 0 {
            CANONICAL_CONFIDENCE
        } else {
            FALLBACK_CONFIDENCE
        }
    }
}

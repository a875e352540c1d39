//! Section keys, locator matches and per-section analyses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical identifier of one of the three tracked filing sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKey {
    /// Item 1A, risk disclosure.
    RiskFactors,
    /// Item 7, management's discussion and analysis.
    Mdna,
    /// Item 8, financial statements and supplementary data.
    FinancialStatements,
}

impl SectionKey {
    pub const ALL: [SectionKey; 3] = [
        SectionKey::RiskFactors,
        SectionKey::Mdna,
        SectionKey::FinancialStatements,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKey::RiskFactors => "risk_factors",
            SectionKey::Mdna => "mdna",
            SectionKey::FinancialStatements => "financial_statements",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            SectionKey::RiskFactors => &["risk_factors", "item_1a", "1a", "risk", "risks"],
            SectionKey::Mdna => &[
                "mdna",
                "item_7",
                "7",
                "md&a",
                "md_and_a",
                "management_discussion",
                "management_discussion_and_analysis",
            ],
            SectionKey::FinancialStatements => &[
                "financial_statements",
                "item_8",
                "8",
                "financials",
                "financial",
            ],
        }
    }

    /// Resolve a requested key or synonym to its canonical section.
    ///
    /// Matching is case-insensitive and treats spaces, dashes and underscores
    /// alike, so `"Risk Factors"`, `"item-1a"` and `"risk_factors"` all resolve.
    pub fn resolve(raw: &str) -> Option<SectionKey> {
        let normalized: String = raw
            .trim()
            .to_ascii_lowercase()
            .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("_");
        SectionKey::ALL
            .into_iter()
            .find(|key| key.aliases().contains(&normalized.as_str()))
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Locator output for one section. Never mutated after location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionMatch {
    pub key: SectionKey,
    pub found: bool,
    pub confidence: f64,
    /// Byte offset of the heading in the source; `None` when not found.
    pub start: Option<usize>,
    /// Byte offset where the section ends in the source; `None` when not found.
    pub end: Option<usize>,
    pub length_chars: usize,
    pub content: String,
}

impl SectionMatch {
    pub fn not_found(key: SectionKey) -> Self {
        Self {
            key,
            found: false,
            confidence: 0.0,
            start: None,
            end: None,
            length_chars: 0,
            content: String::new(),
        }
    }

    pub fn found(key: SectionKey, confidence: f64, start: usize, end: usize, content: String) -> Self {
        Self {
            key,
            found: true,
            confidence,
            start: Some(start),
            end: Some(end),
            length_chars: content.chars().count(),
            content,
        }
    }
}

/// Summarizer output for one requested section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionAnalysis {
    pub section: SectionKey,
    pub found: bool,
    pub confidence: f64,
    pub summary: Vec<String>,
    pub evidence: Vec<String>,
}

impl SectionAnalysis {
    pub fn placeholder(section: SectionKey) -> Self {
        Self {
            section,
            found: false,
            confidence: 0.0,
            summary: Vec::new(),
            evidence: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_aliases() {
        assert_eq!(SectionKey::resolve("risk_factors"), Some(SectionKey::RiskFactors));
        assert_eq!(SectionKey::resolve("Risk Factors"), Some(SectionKey::RiskFactors));
        assert_eq!(SectionKey::resolve("ITEM-1A"), Some(SectionKey::RiskFactors));
        assert_eq!(SectionKey::resolve("MD&A"), Some(SectionKey::Mdna));
        assert_eq!(SectionKey::resolve("item 7"), Some(SectionKey::Mdna));
        assert_eq!(SectionKey::resolve("financials"), Some(SectionKey::FinancialStatements));
        assert_eq!(SectionKey::resolve("exhibits"), None);
    }

    #[test]
    fn test_not_found_match_is_empty() {
        let m = SectionMatch::not_found(SectionKey::Mdna);
        assert!(!m.found);
        assert_eq!(m.confidence, 0.0);
        assert_eq!(m.start, None);
        assert_eq!(m.end, None);
        assert_eq!(m.length_chars, 0);
        assert!(m.content.is_empty());
    }

    #[test]
    fn test_found_match_counts_chars_not_bytes() {
        let m = SectionMatch::found(SectionKey::Mdna, 0.95, 0, 10, "café".to_string());
        assert_eq!(m.length_chars, 4);
    }
}

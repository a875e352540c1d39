//! Keyword-weighted extractive summaries of located sections.

use regex::Regex;

use crate::domain::{Result, SectionAnalysis, SectionKey, SectionMatch};

pub const MAX_SUMMARY_SENTENCES: usize = 5;
pub const MAX_EVIDENCE_SNIPPETS: usize = 3;
pub const MAX_EVIDENCE_CHARS: usize = 200;
pub const MIN_SENTENCE_CHARS: usize = 40;
pub const MAX_SENTENCE_CHARS: usize = 400;

/// Score bonus for a sentence quoting a currency figure or a percentage.
const FIGURE_BONUS: usize = 2;

const SENTENCE_END: &str = r#"[.!?]["'\u{2019}\u{201d})\]]*\s+"#;
const FIGURE: &str = r"(?i)(?:[$€£]\s?\d|\d(?:[\d,]*\d)?(?:\.\d+)?\s?(?:%|percent\b))";

const RISK_TERMS: &[&str] = &[
    "risk",
    "uncertain",
    "adverse",
    "litigation",
    "regulation",
    "regulatory",
    "competition",
    "cybersecurity",
    "volatility",
    "could harm",
    "material",
    "depend",
];

const DISCUSSION_TERMS: &[&str] = &[
    "increase",
    "decrease",
    "growth",
    "decline",
    "compared",
    "trend",
    "outlook",
    "primarily due",
    "driven by",
    "results of operations",
    "liquidity",
    "margin",
];

const FINANCIAL_TERMS: &[&str] = &[
    "revenue",
    "net income",
    "earnings",
    "assets",
    "liabilities",
    "cash flow",
    "equity",
    "balance sheet",
    "operating income",
    "per share",
    "total",
    "fiscal",
];

/// Curated scoring keywords for a section type.
pub fn keywords(key: SectionKey) -> &'static [&'static str] {
    match key {
        SectionKey::RiskFactors => RISK_TERMS,
        SectionKey::Mdna => DISCUSSION_TERMS,
        SectionKey::FinancialStatements => FINANCIAL_TERMS,
    }
}

/// Per-section analyses plus the cross-section overview.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub sections: Vec<SectionAnalysis>,
    pub overall: Vec<String>,
}

/// Extracts top-scoring sentences from each section.
#[derive(Debug, Clone)]
pub struct Summarizer {
    sentence_end: Regex,
    figure: Regex,
}

impl Summarizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            sentence_end: Regex::new(SENTENCE_END)?,
            figure: Regex::new(FIGURE)?,
        })
    }

    /// Analyze each required section; not-found sections get placeholders.
    pub fn summarize(&self, sections: &[SectionMatch], required: &[SectionKey]) -> Summary {
        let analyses: Vec<SectionAnalysis> = required
            .iter()
            .map(|key| match sections.iter().find(|s| s.key == *key && s.found) {
                Some(section) => self.analyze(section),
                None => SectionAnalysis::placeholder(*key),
            })
            .collect();
        let overall = overall_summary(&analyses);
        Summary {
            sections: analyses,
            overall,
        }
    }

    pub fn analyze(&self, section: &SectionMatch) -> SectionAnalysis {
        let ranked = self.rank(&section.content, keywords(section.key));
        SectionAnalysis {
            section: section.key,
            found: true,
            confidence: section.confidence,
            summary: ranked
                .iter()
                .take(MAX_SUMMARY_SENTENCES)
                .map(|s| s.to_string())
                .collect(),
            evidence: ranked
                .iter()
                .take(MAX_EVIDENCE_SNIPPETS)
                .map(|s| truncate_with_ellipsis(s, MAX_EVIDENCE_CHARS))
                .collect(),
        }
    }

    /// Sentences within the length band, best first; ties keep document order.
    pub fn rank<'a>(&self, content: &'a str, terms: &[&str]) -> Vec<&'a str> {
        let mut scored: Vec<(usize, &str)> = self
            .sentences(content)
            .into_iter()
            .filter(|s| {
                let len = s.chars().count();
                (MIN_SENTENCE_CHARS..=MAX_SENTENCE_CHARS).contains(&len)
            })
            .map(|s| (self.score(s, terms), s))
            .collect();
        // sort_by is stable
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, s)| s).collect()
    }

    pub fn sentences<'a>(&self, content: &'a str) -> Vec<&'a str> {
        let mut out = Vec::new();
        let mut cursor = 0usize;
        for m in self.sentence_end.find_iter(content) {
            let sentence = content[cursor..m.end()].trim();
            if !sentence.is_empty() {
                out.push(sentence);
            }
            cursor = m.end();
        }
        let tail = content[cursor..].trim();
        if !tail.is_empty() {
            out.push(tail);
        }
        out
    }

    pub fn score(&self, sentence: &str, terms: &[&str]) -> usize {
        let lower = sentence.to_lowercase();
        let hits: usize = terms.iter().map(|t| lower.matches(t).count()).sum();
        if self.figure.is_match(sentence) {
            hits + FIGURE_BONUS
        } else {
            hits
        }
    }
}

/// Found/missing listing followed by each found section's lead sentence.
pub fn overall_summary(analyses: &[SectionAnalysis]) -> Vec<String> {
    let found: Vec<&str> = analyses
        .iter()
        .filter(|a| a.found)
        .map(|a| a.section.as_str())
        .collect();
    let missing: Vec<&str> = analyses
        .iter()
        .filter(|a| !a.found)
        .map(|a| a.section.as_str())
        .collect();

    let mut lines = Vec::new();
    if found.is_empty() {
        lines.push("Sections found: none".to_string());
    } else {
        lines.push(format!("Sections found: {}", found.join(", ")));
    }
    if !missing.is_empty() {
        lines.push(format!("Sections missing: {}", missing.join(", ")));
    }
    for analysis in analyses.iter().filter(|a| a.found) {
        if let Some(top) = analysis.summary.first() {
            lines.push(format!("{}: {}", analysis.section, top));
        }
    }
    lines
}

fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summarizer() -> Summarizer {
        Summarizer::new().expect("summarizer")
    }

    #[test]
    fn test_sentence_split_on_terminal_punctuation() {
        let s = summarizer();
        let parts = s.sentences("Revenue rose. Costs fell! Why? \"Quoted.\" Tail without stop");
        assert_eq!(
            parts,
            vec!["Revenue rose.", "Costs fell!", "Why?", "\"Quoted.\"", "Tail without stop"]
        );
    }

    #[test]
    fn test_decimal_points_do_not_split() {
        let s = summarizer();
        let parts = s.sentences("Revenue was $3.5 billion in 2023. Next.");
        assert_eq!(parts, vec!["Revenue was $3.5 billion in 2023.", "Next."]);
    }

    #[test]
    fn test_score_counts_keywords_and_figures() {
        let s = summarizer();
        let terms = keywords(SectionKey::FinancialStatements);
        assert_eq!(s.score("Revenue and net income grew.", terms), 2);
        assert_eq!(s.score("Revenue grew 12% year over year.", terms), 3);
        assert_eq!(s.score("Revenue reached $4,200 million.", terms), 3);
        assert_eq!(s.score("Nothing relevant here.", terms), 0);
    }

    #[test]
    fn test_rank_is_stable_on_ties() {
        let s = summarizer();
        let content = "The first neutral sentence is long enough to count. \
                       The second neutral sentence is long enough to count. \
                       Risk of adverse regulation is the top risk we face today.";
        let ranked = s.rank(content, keywords(SectionKey::RiskFactors));
        assert_eq!(ranked.len(), 3);
        assert!(ranked[0].starts_with("Risk of adverse"));
        assert!(ranked[1].starts_with("The first"));
        assert!(ranked[2].starts_with("The second"));
    }

    #[test]
    fn test_length_band_filters_sentences() {
        let s = summarizer();
        let long = format!("{}.", "word ".repeat(100));
        let content = format!("Too short. {} This sentence has a reasonable length for a summary.", long);
        let ranked = s.rank(&content, &[]);
        assert_eq!(ranked, vec!["This sentence has a reasonable length for a summary."]);
    }

    #[test]
    fn test_bounds_on_summary_and_evidence() {
        let content = (0..12)
            .map(|i| format!("Risk factor {} could materially harm our business and results{}.", i, " significantly".repeat(12)))
            .collect::<Vec<_>>()
            .join(" ");
        let section = SectionMatch::found(SectionKey::RiskFactors, 0.95, 0, 10, content);
        let analysis = summarizer().analyze(&section);
        assert_eq!(analysis.summary.len(), MAX_SUMMARY_SENTENCES);
        assert_eq!(analysis.evidence.len(), MAX_EVIDENCE_SNIPPETS);
        for e in &analysis.evidence {
            assert!(e.chars().count() <= MAX_EVIDENCE_CHARS);
        }
        assert!(analysis.evidence[0].ends_with("..."));
    }

    #[test]
    fn test_missing_section_yields_placeholder() {
        let found = SectionMatch::found(
            SectionKey::Mdna,
            0.95,
            0,
            10,
            "Revenue increased primarily due to growth in services compared to last year.".to_string(),
        );
        let summary = summarizer().summarize(
            &[found, SectionMatch::not_found(SectionKey::RiskFactors)],
            &[SectionKey::RiskFactors, SectionKey::Mdna],
        );
        assert_eq!(summary.sections.len(), 2);
        let risk = &summary.sections[0];
        assert!(!risk.found);
        assert!(risk.summary.is_empty());
        assert!(risk.evidence.is_empty());
        assert_eq!(
            summary.overall,
            vec![
                "Sections found: mdna".to_string(),
                "Sections missing: risk_factors".to_string(),
                "mdna: Revenue increased primarily due to growth in services compared to last year."
                    .to_string(),
            ]
        );
    }
}

//! Run options, invocation mode and the mutable run context.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::document::FetchedDocument;
use crate::domain::section::{SectionAnalysis, SectionKey, SectionMatch};
use crate::domain::step::StepResult;

/// Enforcement policy of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunMode {
    /// Every step is mandatory and a required failure halts the run.
    #[serde(rename = "command")]
    Strict,
    /// Validation and generation are best-effort; gaps are recorded, not enforced.
    #[serde(rename = "intent")]
    Lenient,
}

impl RunMode {
    pub fn is_strict(&self) -> bool {
        matches!(self, RunMode::Strict)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Strict => "command",
            RunMode::Lenient => "intent",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "command" | "strict" => Ok(RunMode::Strict),
            "intent" | "lenient" => Ok(RunMode::Lenient),
            other => Err(format!("unknown run mode: {}", other)),
        }
    }
}

/// Immutable options of a single run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    pub ticker: String,
    pub year: u16,
    pub mode: RunMode,
    /// Requested section keys as given; aliases are resolved during validation.
    pub required_sections: Vec<String>,
    /// Raise validation failures as errors even outside strict mode.
    pub strict_validation: bool,
    pub invocation_id: Uuid,
}

impl RunOptions {
    /// Options requesting all three sections, with a fresh invocation id.
    pub fn new(ticker: impl Into<String>, year: u16, mode: RunMode) -> Self {
        Self {
            ticker: ticker.into().to_ascii_uppercase(),
            year,
            mode,
            required_sections: SectionKey::ALL
                .iter()
                .map(|k| k.as_str().to_string())
                .collect(),
            strict_validation: false,
            invocation_id: Uuid::new_v4(),
        }
    }

    pub fn with_sections<I, S>(mut self, sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_sections = sections.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_strict_validation(mut self, strict: bool) -> Self {
        self.strict_validation = strict;
        self
    }

    pub fn with_invocation_id(mut self, id: Uuid) -> Self {
        self.invocation_id = id;
        self
    }

    /// Requested keys that resolve to a known section, deduplicated in request order.
    pub fn resolved_sections(&self) -> Vec<SectionKey> {
        let mut keys = Vec::new();
        for raw in &self.required_sections {
            if let Some(key) = SectionKey::resolve(raw) {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }
}

/// The single mutable object threaded through one run's steps.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub document: Option<FetchedDocument>,
    pub text: String,
    pub sections: Vec<SectionMatch>,
    pub analyses: Vec<SectionAnalysis>,
    pub step_results: Vec<StepResult>,
    pub overall_summary: Vec<String>,
    /// Soft failures recorded by best-effort steps.
    pub warnings: Vec<String>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(&self, key: SectionKey) -> Option<&SectionMatch> {
        self.sections.iter().find(|s| s.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_serializes_as_command_and_intent() {
        assert_eq!(serde_json::to_string(&RunMode::Strict).unwrap(), "\"command\"");
        assert_eq!(serde_json::to_string(&RunMode::Lenient).unwrap(), "\"intent\"");
        assert_eq!("strict".parse::<RunMode>().unwrap(), RunMode::Strict);
        assert_eq!("intent".parse::<RunMode>().unwrap(), RunMode::Lenient);
        assert!("batch".parse::<RunMode>().is_err());
    }

    #[test]
    fn test_options_default_to_all_sections() {
        let opts = RunOptions::new("aapl", 2023, RunMode::Strict);
        assert_eq!(opts.ticker, "AAPL");
        assert_eq!(opts.resolved_sections(), SectionKey::ALL.to_vec());
        assert!(!opts.strict_validation);
    }

    #[test]
    fn test_resolved_sections_dedupes_aliases_and_drops_unknown() {
        let opts = RunOptions::new("MSFT", 2022, RunMode::Lenient)
            .with_sections(["item 7", "mdna", "exhibits", "risk"]);
        assert_eq!(
            opts.resolved_sections(),
            vec![SectionKey::Mdna, SectionKey::RiskFactors]
        );
    }

    #[test]
    fn test_invocation_ids_are_unique() {
        let a = RunOptions::new("X", 2020, RunMode::Strict);
        let b = RunOptions::new("X", 2020, RunMode::Strict);
        assert_ne!(a.invocation_id, b.invocation_id);
    }
}

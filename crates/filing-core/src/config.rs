//! Environment-driven analysis settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::validate::MIN_SECTION_CHARS;

pub const DEFAULT_STRICT_THRESHOLD: f64 = 0.75;
pub const DEFAULT_LENIENT_THRESHOLD: f64 = 0.5;
pub const DEFAULT_OUTPUT_DIR: &str = ".filing/runs";
pub const DEFAULT_USER_AGENT: &str = "filing-workflow/0.1 (contact@example.com)";
pub const DEFAULT_FETCH_INTERVAL_MS: u64 = 100;

/// Analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Confidence threshold in command mode
    pub strict_threshold: f64,
    /// Confidence threshold in intent mode
    pub lenient_threshold: f64,
    pub min_section_chars: usize,
    /// Root directory for per-run artifacts
    pub output_dir: PathBuf,
    /// Sent with every HTTP fetch; some filing archives reject anonymous agents
    pub user_agent: String,
    pub fetch_interval_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl AnalysisConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Build from an arbitrary variable source. Unparseable values fall back
    /// to the built-in default with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        AnalysisConfig {
            strict_threshold: parse_or(&lookup, "FILING_STRICT_THRESHOLD", DEFAULT_STRICT_THRESHOLD),
            lenient_threshold: parse_or(&lookup, "FILING_LENIENT_THRESHOLD", DEFAULT_LENIENT_THRESHOLD),
            min_section_chars: parse_or(&lookup, "FILING_MIN_SECTION_CHARS", MIN_SECTION_CHARS),
            output_dir: lookup("FILING_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            user_agent: lookup("FILING_USER_AGENT")
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            fetch_interval_ms: parse_or(&lookup, "FILING_FETCH_INTERVAL_MS", DEFAULT_FETCH_INTERVAL_MS),
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn fetch_interval(&self) -> Duration {
        Duration::from_millis(self.fetch_interval_ms)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key = %key, value = %raw, "Ignoring unparseable setting");
                default
            }
        },
    }
}

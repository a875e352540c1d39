//! Workflow step names, lifecycle states and per-step results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of workflow steps, in canonical execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    Fetch,
    Extract,
    LocateSections,
    Validate,
    Generate,
    EmitLedger,
}

impl StepName {
    /// Every step, in canonical order. The ledger measures coverage against this.
    pub const ALL: [StepName; 6] = [
        StepName::Fetch,
        StepName::Extract,
        StepName::LocateSections,
        StepName::Validate,
        StepName::Generate,
        StepName::EmitLedger,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::Fetch => "fetch",
            StepName::Extract => "extract",
            StepName::LocateSections => "locate_sections",
            StepName::Validate => "validate",
            StepName::Generate => "generate",
            StepName::EmitLedger => "emit_ledger",
        }
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        StepName::ALL
            .into_iter()
            .find(|step| step.as_str() == normalized)
            .ok_or_else(|| format!("unknown step: {}", s))
    }
}

/// Lifecycle of a single step inside one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Pending,
    Running,
    Passed,
    Failed,
    Skipped,
}

impl StepState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepState::Passed | StepState::Failed | StepState::Skipped)
    }

    /// Legal moves: `pending -> running | skipped`, `running -> passed | failed`.
    pub fn can_transition_to(&self, next: StepState) -> bool {
        use StepState::*;
        matches!(
            (self, next),
            (Pending, Running) | (Pending, Skipped) | (Running, Passed) | (Running, Failed)
        )
    }
}

/// Terminal outcome recorded for a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Passed,
    Failed,
    Skipped,
}

impl StepStatus {
    /// Passed and failed steps both count as executed.
    pub fn is_executed(&self) -> bool {
        !matches!(self, StepStatus::Skipped)
    }
}

/// Result of one step execution. Exactly one per step per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step: StepName,
    pub status: StepStatus,
    pub duration_ms: u64,
    pub error: Option<String>,
}

impl StepResult {
    pub fn passed(step: StepName, duration_ms: u64) -> Self {
        Self {
            step,
            status: StepStatus::Passed,
            duration_ms,
            error: None,
        }
    }

    pub fn failed(step: StepName, duration_ms: u64, error: impl Into<String>) -> Self {
        Self {
            step,
            status: StepStatus::Failed,
            duration_ms,
            error: Some(error.into()),
        }
    }

    /// A skipped step never ran, so it carries zero duration.
    pub fn skipped(step: StepName, notice: Option<String>) -> Self {
        Self {
            step,
            status: StepStatus::Skipped,
            duration_ms: 0,
            error: notice,
        }
    }
}

//! Audit ledger and analysis artifact models.
//!
//! Both artifacts use camelCase keys on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::run::RunMode;
use crate::domain::section::{SectionAnalysis, SectionKey};
use crate::domain::step::StepName;

/// Constant identifier of the workflow definition recorded in artifacts.
pub const WORKFLOW_ID: &str = "filing-section-analysis/v1";

/// Found/confidence/length snapshot of one located section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSnapshot {
    pub found: bool,
    pub confidence: f64,
    pub length_chars: usize,
}

/// Reconciliation of required vs executed steps for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLedger {
    pub invocation_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub mode: RunMode,
    pub deterministic: bool,
    pub workflow: String,
    pub required_steps: Vec<StepName>,
    pub executed_steps: Vec<StepName>,
    pub skipped_steps: Vec<StepName>,
    /// Executed steps that failed, required or not.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub failed_steps: Vec<StepName>,
    pub durations_ms: BTreeMap<StepName, u64>,
    pub section_validation: BTreeMap<SectionKey, SectionSnapshot>,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub failure_reason: Option<String>,
}

impl AuditLedger {
    /// Names of the step universe that appear in neither list.
    pub fn uncovered_steps(&self) -> Vec<StepName> {
        StepName::ALL
            .iter()
            .copied()
            .filter(|s| !self.executed_steps.contains(s) && !self.skipped_steps.contains(s))
            .collect()
    }
}

/// Ticker/year pair the analysis was produced for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisInput {
    pub ticker: String,
    pub year: u16,
}

/// Per-section summaries of a passed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisArtifact {
    pub invocation_id: Uuid,
    pub mode: RunMode,
    pub workflow: String,
    pub input: AnalysisInput,
    pub sections: Vec<SectionAnalysis>,
    pub overall_summary: Vec<String>,
}

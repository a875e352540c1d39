//! Pure reconciliation of a finished run into its artifacts.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use filing_core::domain::{
    AnalysisArtifact, AnalysisInput, AuditLedger, RunContext, RunOptions, SectionSnapshot,
    StepName, StepStatus, WORKFLOW_ID,
};

use crate::planner::WorkflowPlan;

/// Pass/fail verdict decided by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub passed: bool,
    pub failure_reason: Option<String>,
}

impl RunOutcome {
    pub fn passed() -> Self {
        Self {
            passed: true,
            failure_reason: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            failure_reason: Some(reason.into()),
        }
    }
}

pub struct LedgerBuilder;

impl LedgerBuilder {
    /// Classify recorded step results and snapshot the located sections.
    ///
    /// The verdict comes from `outcome`; nothing here decides success.
    pub fn build(
        invocation_id: uuid::Uuid,
        ctx: &RunContext,
        plan: &WorkflowPlan,
        outcome: &RunOutcome,
        timestamp: DateTime<Utc>,
    ) -> AuditLedger {
        let mut executed: Vec<StepName> = Vec::new();
        let mut failed: Vec<StepName> = Vec::new();
        let mut durations = BTreeMap::new();
        for result in &ctx.step_results {
            durations.insert(result.step, result.duration_ms);
            if result.status.is_executed() && !executed.contains(&result.step) {
                executed.push(result.step);
            }
            if result.status == StepStatus::Failed && !failed.contains(&result.step) {
                failed.push(result.step);
            }
        }

        let skipped: Vec<StepName> = StepName::ALL
            .iter()
            .copied()
            .filter(|step| !executed.contains(step))
            .filter(|step| {
                plan.is_skipped(*step)
                    || ctx
                        .step_results
                        .iter()
                        .any(|r| r.step == *step && !r.status.is_executed())
            })
            .collect();

        let section_validation = ctx
            .sections
            .iter()
            .map(|s| {
                (
                    s.key,
                    SectionSnapshot {
                        found: s.found,
                        confidence: s.confidence,
                        length_chars: s.length_chars,
                    },
                )
            })
            .collect();

        AuditLedger {
            invocation_id,
            timestamp,
            mode: plan.mode,
            deterministic: plan.mode.is_strict(),
            workflow: WORKFLOW_ID.to_string(),
            required_steps: StepName::ALL.to_vec(),
            executed_steps: executed,
            skipped_steps: skipped,
            failed_steps: failed,
            durations_ms: durations,
            section_validation,
            passed: outcome.passed,
            failure_reason: outcome.failure_reason.clone(),
        }
    }

    pub fn analysis(options: &RunOptions, ctx: &RunContext, plan: &WorkflowPlan) -> AnalysisArtifact {
        AnalysisArtifact {
            invocation_id: options.invocation_id,
            mode: plan.mode,
            workflow: WORKFLOW_ID.to_string(),
            input: AnalysisInput {
                ticker: options.ticker.clone(),
                year: options.year,
            },
            sections: ctx.analyses.clone(),
            overall_summary: ctx.overall_summary.clone(),
        }
    }
}

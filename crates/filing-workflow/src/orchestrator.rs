//! Step sequencing, mode enforcement and artifact emission.

use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn, Instrument};

use filing_core::domain::{
    AnalysisArtifact, AuditLedger, FilingError, Result, RunContext, RunOptions, StepName,
    StepResult, StepState, StepStatus,
};
use filing_core::obs::{
    emit_ledger_emitted, emit_run_finished, emit_run_halted, emit_run_started,
    emit_step_finished, run_span,
};
use filing_core::reporting::ArtifactSink;

use crate::ledger::{LedgerBuilder, RunOutcome};
use crate::planner::WorkflowPlan;
use crate::steps::StepExecutor;

/// Process exit signal of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunExit {
    Success,
    /// A required step failed, or an unrecovered error occurred.
    Failure,
    /// Command-mode halt on section validation.
    ValidationFailure,
}

impl RunExit {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunExit::Success => 0,
            RunExit::Failure => 1,
            RunExit::ValidationFailure => 2,
        }
    }
}

/// Everything a caller needs after a run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub ledger: AuditLedger,
    pub analysis: Option<AnalysisArtifact>,
    pub exit: RunExit,
    pub failed_step: Option<StepName>,
    /// Optional steps that failed without failing the run.
    pub failed_optional: Vec<StepName>,
    /// Remediation hints for `failed_step` and `failed_optional`.
    pub hints: Vec<String>,
    pub warnings: Vec<String>,
    pub context: RunContext,
}

/// The first failed required step and its message.
#[derive(Debug, Clone)]
struct Failure {
    step: StepName,
    message: String,
    validation: bool,
}

pub struct Orchestrator;

impl Orchestrator {
    /// Execute `plan` for `options`.
    ///
    /// Step errors are captured into their `StepResult`. In command mode the
    /// first failed required step halts the sequence and the steps after it
    /// are recorded as skipped. A failed optional step leaves the run passed
    /// but lands in `failed_optional`, the warnings and the ledger's
    /// `failedSteps`. `emit_ledger` runs exactly once at the end;
    /// the analysis artifact is written only for passed runs. Only sink
    /// errors escape as `Err`.
    pub async fn run(
        options: &RunOptions,
        plan: &WorkflowPlan,
        executor: &dyn StepExecutor,
        sink: &dyn ArtifactSink,
    ) -> Result<RunReport> {
        let span = run_span(&options.invocation_id.to_string());
        Self::drive(options, plan, executor, sink)
            .instrument(span)
            .await
    }

    async fn drive(
        options: &RunOptions,
        plan: &WorkflowPlan,
        executor: &dyn StepExecutor,
        sink: &dyn ArtifactSink,
    ) -> Result<RunReport> {
        let invocation = options.invocation_id.to_string();
        let run_start = Instant::now();
        emit_run_started(&invocation, &options.ticker, options.year, options.mode.as_str());

        let mut ctx = RunContext::new();
        let mut failure: Option<Failure> = None;
        let mut failed_optional: Vec<StepName> = Vec::new();
        let mut halted_after: Option<StepName> = None;

        for planned in plan.steps.iter().filter(|s| s.name != StepName::EmitLedger) {
            let step = planned.name;

            if let Some(halt) = halted_after {
                ctx.step_results.push(StepResult::skipped(
                    step,
                    Some(format!("not run: halted after {} failed", halt)),
                ));
                continue;
            }

            if plan.is_skipped(step) {
                info!(step = %step, "Skipping step");
                ctx.step_results.push(StepResult::skipped(step, None));
                emit_step_finished(step, StepStatus::Skipped, 0);
                continue;
            }

            let mut state = StepState::Pending;
            advance(&mut state, StepState::Running, step)?;
            let started = Instant::now();
            let outcome = executor.execute(step, &mut ctx, options, plan).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            let result = match outcome {
                Ok(()) => {
                    advance(&mut state, StepState::Passed, step)?;
                    StepResult::passed(step, duration_ms)
                }
                Err(err) => {
                    advance(&mut state, StepState::Failed, step)?;
                    warn!(step = %step, error = %err, "Step failed");
                    if !planned.required {
                        ctx.warnings.push(format!("{} failed: {}", step, err));
                        failed_optional.push(step);
                    } else if failure.is_none() {
                        failure = Some(Failure {
                            step,
                            message: err.to_string(),
                            validation: err.is_validation(),
                        });
                    }
                    if planned.required && plan.mode.is_strict() {
                        emit_run_halted(step, &err);
                        halted_after = Some(step);
                    }
                    StepResult::failed(step, duration_ms, err.to_string())
                }
            };
            emit_step_finished(step, result.status, duration_ms);
            ctx.step_results.push(result);
        }

        let run_outcome = match &failure {
            None => RunOutcome::passed(),
            Some(f) => RunOutcome::failed(format!("{}: {}", f.step, f.message)),
        };

        // Recorded before the build so the ledger covers its own emission.
        ctx.step_results.push(StepResult::passed(StepName::EmitLedger, 0));
        let ledger = LedgerBuilder::build(options.invocation_id, &ctx, plan, &run_outcome, Utc::now());
        sink.write_ledger(&ledger).await?;
        emit_ledger_emitted(&invocation, ledger.executed_steps.len(), ledger.skipped_steps.len());

        let analysis = if run_outcome.passed {
            let artifact = LedgerBuilder::analysis(options, &ctx, plan);
            sink.write_analysis(&artifact).await?;
            Some(artifact)
        } else {
            None
        };

        let exit = match &failure {
            None => RunExit::Success,
            Some(f) if halted_after == Some(StepName::Validate) && f.validation => {
                RunExit::ValidationFailure
            }
            Some(_) => RunExit::Failure,
        };
        let failed_step = failure.as_ref().map(|f| f.step);
        let mut hints: Vec<String> = Vec::new();
        for step in failed_step.iter().chain(failed_optional.iter()) {
            for hint in remediation_hints(*step, plan) {
                if !hints.contains(&hint) {
                    hints.push(hint);
                }
            }
        }

        emit_run_finished(&invocation, run_start.elapsed().as_millis() as u64, run_outcome.passed);

        Ok(RunReport {
            ledger,
            analysis,
            exit,
            failed_step,
            failed_optional,
            hints,
            warnings: ctx.warnings.clone(),
            context: ctx,
        })
    }
}

fn advance(state: &mut StepState, next: StepState, step: StepName) -> Result<()> {
    if !state.can_transition_to(next) {
        return Err(FilingError::Step {
            step,
            message: format!("illegal transition {:?} -> {:?}", state, next),
        });
    }
    *state = next;
    Ok(())
}

/// User-facing suggestions for a failed step.
pub fn remediation_hints(step: StepName, plan: &WorkflowPlan) -> Vec<String> {
    match step {
        StepName::Validate => vec![
            format!(
                "lower the confidence threshold (currently {:.2}) with --threshold",
                plan.threshold
            ),
            "re-run in intent mode (--mode intent) to record missing sections instead of halting"
                .to_string(),
            "check the requested section names: risk_factors, mdna, financial_statements"
                .to_string(),
        ],
        StepName::Fetch => vec![
            "check the ticker and filing year".to_string(),
            "verify that the --input path or --url source is reachable".to_string(),
        ],
        StepName::Extract => vec![
            "supply pre-extracted text with --text for binary documents".to_string(),
            "confirm the document is complete; at least 200 characters of text are required"
                .to_string(),
        ],
        StepName::LocateSections => vec![
            "confirm the document is an annual report with numbered Item headings".to_string(),
        ],
        StepName::Generate => vec!["re-run with --verbose to inspect the summarizer".to_string()],
        StepName::EmitLedger => vec!["check that the output directory is writable".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::WorkflowPlanner;
    use async_trait::async_trait;
    use filing_core::domain::{RunMode, SectionFailure, ValidationFailure};
    use filing_core::fakes::MemoryArtifactSink;
    use std::sync::Mutex;

    /// Executor that fails a chosen step and records what it ran.
    struct ScriptedSteps {
        fail: Option<(StepName, bool)>,
        ran: Mutex<Vec<StepName>>,
    }

    impl ScriptedSteps {
        fn new(fail: Option<(StepName, bool)>) -> Self {
            Self {
                fail,
                ran: Mutex::new(Vec::new()),
            }
        }

        fn ran(&self) -> Vec<StepName> {
            self.ran.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl StepExecutor for ScriptedSteps {
        async fn execute(
            &self,
            step: StepName,
            _ctx: &mut RunContext,
            _options: &RunOptions,
            _plan: &WorkflowPlan,
        ) -> Result<()> {
            self.ran.lock().expect("lock").push(step);
            match self.fail {
                Some((failing, true)) if failing == step => Err(FilingError::Validation(
                    ValidationFailure {
                        failures: vec![SectionFailure::NotFound {
                            key: "mdna".to_string(),
                        }],
                    },
                )),
                Some((failing, false)) if failing == step => {
                    Err(FilingError::Fetch("connection refused".to_string()))
                }
                _ => Ok(()),
            }
        }
    }

    async fn run(
        mode: RunMode,
        executor: &ScriptedSteps,
        skip: &[StepName],
    ) -> (RunReport, MemoryArtifactSink) {
        let options = RunOptions::new("AAPL", 2023, mode);
        let plan = WorkflowPlanner::default()
            .plan(&options)
            .with_skipped(skip.iter().copied());
        let sink = MemoryArtifactSink::new();
        let report = Orchestrator::run(&options, &plan, executor, &sink)
            .await
            .expect("run");
        (report, sink)
    }

    #[tokio::test]
    async fn test_clean_strict_run() {
        let executor = ScriptedSteps::new(None);
        let (report, sink) = run(RunMode::Strict, &executor, &[]).await;
        assert_eq!(report.exit, RunExit::Success);
        assert!(report.ledger.passed);
        assert_eq!(report.ledger.executed_steps, StepName::ALL.to_vec());
        assert!(report.ledger.skipped_steps.is_empty());
        assert_eq!(executor.ran().len(), 5);
        assert_eq!(sink.ledgers().len(), 1);
        assert_eq!(sink.analyses().len(), 1);
    }

    #[tokio::test]
    async fn test_strict_validation_failure_halts() {
        let executor = ScriptedSteps::new(Some((StepName::Validate, true)));
        let (report, sink) = run(RunMode::Strict, &executor, &[]).await;
        assert_eq!(report.exit, RunExit::ValidationFailure);
        assert_eq!(report.exit.exit_code(), 2);
        assert!(!executor.ran().contains(&StepName::Generate));
        assert_eq!(report.ledger.skipped_steps, vec![StepName::Generate]);
        assert!(report.ledger.uncovered_steps().is_empty());
        assert_eq!(report.failed_step, Some(StepName::Validate));
        assert!(report.hints[0].contains("threshold"));
        assert!(report
            .ledger
            .failure_reason
            .as_deref()
            .expect("reason")
            .starts_with("validate: section validation failed"));
        assert_eq!(sink.ledgers().len(), 1);
        assert!(sink.analyses().is_empty());
        let generate = report
            .context
            .step_results
            .iter()
            .find(|r| r.step == StepName::Generate)
            .expect("generate result");
        assert_eq!(generate.status, StepStatus::Skipped);
        assert!(generate.error.as_deref().expect("notice").starts_with("not run"));
    }

    #[tokio::test]
    async fn test_strict_fetch_failure_is_general_failure() {
        let executor = ScriptedSteps::new(Some((StepName::Fetch, false)));
        let (report, _) = run(RunMode::Strict, &executor, &[]).await;
        assert_eq!(report.exit, RunExit::Failure);
        assert_eq!(executor.ran(), vec![StepName::Fetch]);
        assert_eq!(report.ledger.executed_steps, vec![StepName::Fetch, StepName::EmitLedger]);
        assert!(report.hints.iter().any(|h| h.contains("ticker")));
    }

    #[tokio::test]
    async fn test_lenient_optional_failure_continues() {
        let executor = ScriptedSteps::new(Some((StepName::Validate, true)));
        let (report, sink) = run(RunMode::Lenient, &executor, &[]).await;
        assert_eq!(report.exit, RunExit::Success);
        assert!(report.ledger.passed);
        assert!(executor.ran().contains(&StepName::Generate));
        assert_eq!(report.failed_step, None);
        assert_eq!(report.failed_optional, vec![StepName::Validate]);
        assert_eq!(report.ledger.failed_steps, vec![StepName::Validate]);
        assert!(report.warnings[0].starts_with("validate failed: section validation failed"));
        assert!(report.hints[0].contains("threshold"));
        assert_eq!(sink.analyses().len(), 1);
    }

    #[tokio::test]
    async fn test_lenient_required_failure_continues_but_fails() {
        let executor = ScriptedSteps::new(Some((StepName::Fetch, false)));
        let (report, sink) = run(RunMode::Lenient, &executor, &[]).await;
        assert_eq!(report.exit, RunExit::Failure);
        assert!(!report.ledger.passed);
        assert_eq!(executor.ran().len(), 5);
        assert!(sink.analyses().is_empty());
    }

    #[tokio::test]
    async fn test_skipped_steps_are_not_invoked() {
        let executor = ScriptedSteps::new(None);
        let (report, _) = run(RunMode::Lenient, &executor, &[StepName::Validate]).await;
        assert!(!executor.ran().contains(&StepName::Validate));
        assert_eq!(report.ledger.skipped_steps, vec![StepName::Validate]);
        assert_eq!(report.ledger.durations_ms[&StepName::Validate], 0);
        assert!(report.ledger.executed_steps.len() < report.ledger.required_steps.len());
        assert!(!report.ledger.deterministic);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(RunExit::Success.exit_code(), 0);
        assert_eq!(RunExit::Failure.exit_code(), 1);
        assert_eq!(RunExit::ValidationFailure.exit_code(), 2);
    }
}

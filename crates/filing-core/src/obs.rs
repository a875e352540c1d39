//! Structured lifecycle events for filing runs.
//!
//! - `RunSpan`: RAII guard entering the `filing.run` span for one invocation
//! - `run_span`: the same span, unentered, for `Instrument`
//! - `emit_*`: one `info!` event per lifecycle point, keyed by `event`

use tracing::{info, warn};

use crate::domain::{StepName, StepStatus};

/// RAII guard that keeps a run-scoped span entered.
///
/// ```ignore
/// let _span = RunSpan::enter("5f0c...");
/// // events below carry invocation_id = "5f0c..."
/// ```
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    pub fn enter(invocation_id: &str) -> Self {
        Self {
            _span: run_span(invocation_id).entered(),
        }
    }
}

/// The `filing.run` span, for instrumenting futures that cross awaits.
pub fn run_span(invocation_id: &str) -> tracing::Span {
    tracing::info_span!("filing.run", invocation_id = %invocation_id)
}

pub fn emit_run_started(invocation_id: &str, ticker: &str, year: u16, mode: &str) {
    info!(
        event = "run.started",
        invocation_id = %invocation_id,
        ticker = %ticker,
        year = year,
        mode = %mode,
    );
}

pub fn emit_step_finished(step: StepName, status: StepStatus, duration_ms: u64) {
    info!(
        event = "step.finished",
        step = %step,
        status = ?status,
        duration_ms = duration_ms,
    );
}

/// Strict-mode halt on a required step (warning level).
pub fn emit_run_halted(step: StepName, error: &dyn std::fmt::Display) {
    warn!(event = "run.halted", step = %step, error = %error);
}

pub fn emit_ledger_emitted(invocation_id: &str, executed: usize, skipped: usize) {
    info!(
        event = "ledger.emitted",
        invocation_id = %invocation_id,
        executed = executed,
        skipped = skipped,
    );
}

pub fn emit_run_finished(invocation_id: &str, duration_ms: u64, passed: bool) {
    info!(
        event = "run.finished",
        invocation_id = %invocation_id,
        duration_ms = duration_ms,
        passed = passed,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_span_and_events() {
        let _span = RunSpan::enter("test-invocation");
        emit_run_started("test-invocation", "AAPL", 2023, "command");
        emit_step_finished(StepName::Fetch, StepStatus::Passed, 4);
        emit_run_halted(StepName::Validate, &"mdna: not found");
        emit_ledger_emitted("test-invocation", 5, 1);
        emit_run_finished("test-invocation", 10, false);
    }
}

//! Turns run options into an ordered, mode-aware step plan.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{info, warn};

use filing_core::config::{AnalysisConfig, DEFAULT_LENIENT_THRESHOLD, DEFAULT_STRICT_THRESHOLD};
use filing_core::domain::{FilingError, Result, RunMode, RunOptions, StepName};

/// Confidence thresholds per mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlannerPolicy {
    strict_threshold: f64,
    lenient_threshold: f64,
}

impl Default for PlannerPolicy {
    fn default() -> Self {
        Self {
            strict_threshold: DEFAULT_STRICT_THRESHOLD,
            lenient_threshold: DEFAULT_LENIENT_THRESHOLD,
        }
    }
}

impl PlannerPolicy {
    /// Both thresholds must lie in [0, 1] and strict must not be below lenient.
    pub fn new(strict_threshold: f64, lenient_threshold: f64) -> Result<Self> {
        for (name, value) in [("strict", strict_threshold), ("lenient", lenient_threshold)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(FilingError::Config(format!(
                    "{} threshold {} outside [0, 1]",
                    name, value
                )));
            }
        }
        if strict_threshold < lenient_threshold {
            return Err(FilingError::Config(format!(
                "strict threshold {} is below lenient threshold {}",
                strict_threshold, lenient_threshold
            )));
        }
        Ok(Self {
            strict_threshold,
            lenient_threshold,
        })
    }

    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        Self::new(config.strict_threshold, config.lenient_threshold)
    }

    pub fn threshold_for(&self, mode: RunMode) -> f64 {
        match mode {
            RunMode::Strict => self.strict_threshold,
            RunMode::Lenient => self.lenient_threshold,
        }
    }
}

/// One step of a plan with its required flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedStep {
    pub name: StepName,
    pub required: bool,
}

/// Ordered steps plus the knobs the orchestrator enforces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPlan {
    pub mode: RunMode,
    pub steps: Vec<PlannedStep>,
    pub skipped: BTreeSet<StepName>,
    pub threshold: f64,
    pub hard_fail: bool,
}

impl WorkflowPlan {
    /// Apply an externally decided skip set.
    ///
    /// Strict plans ignore it entirely. `emit_ledger` is never skippable.
    pub fn with_skipped<I>(mut self, skip: I) -> Self
    where
        I: IntoIterator<Item = StepName>,
    {
        let requested: BTreeSet<StepName> = skip.into_iter().collect();
        if requested.is_empty() {
            return self;
        }
        if self.mode.is_strict() {
            info!(requested = ?requested, "Ignoring skip set in command mode");
            return self;
        }
        for step in requested {
            if step == StepName::EmitLedger {
                warn!("Ignoring emit_ledger in skip set; the ledger is always emitted");
                continue;
            }
            self.skipped.insert(step);
        }
        self
    }

    /// Override the mode's threshold, e.g. from `--threshold`.
    pub fn with_threshold(mut self, threshold: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(FilingError::Config(format!(
                "threshold {} outside [0, 1]",
                threshold
            )));
        }
        self.threshold = threshold;
        Ok(self)
    }

    pub fn is_required(&self, step: StepName) -> bool {
        self.steps.iter().any(|s| s.name == step && s.required)
    }

    pub fn is_skipped(&self, step: StepName) -> bool {
        self.skipped.contains(&step)
    }

    pub fn required_steps(&self) -> Vec<StepName> {
        self.steps
            .iter()
            .filter(|s| s.required)
            .map(|s| s.name)
            .collect()
    }
}

/// Builds plans under a threshold policy.
#[derive(Debug, Clone, Default)]
pub struct WorkflowPlanner {
    policy: PlannerPolicy,
}

impl WorkflowPlanner {
    pub fn new(policy: PlannerPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PlannerPolicy {
        &self.policy
    }

    pub fn plan(&self, options: &RunOptions) -> WorkflowPlan {
        let strict = options.mode.is_strict();
        let steps = StepName::ALL
            .iter()
            .map(|&name| PlannedStep {
                name,
                required: match name {
                    StepName::Validate | StepName::Generate => strict,
                    _ => true,
                },
            })
            .collect();

        WorkflowPlan {
            mode: options.mode,
            steps,
            skipped: BTreeSet::new(),
            threshold: self.policy.threshold_for(options.mode),
            hard_fail: options.strict_validation || strict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(mode: RunMode) -> WorkflowPlan {
        WorkflowPlanner::default().plan(&RunOptions::new("AAPL", 2023, mode))
    }

    #[test]
    fn test_strict_plan_requires_every_step() {
        let p = plan(RunMode::Strict);
        assert_eq!(p.required_steps(), StepName::ALL.to_vec());
        assert_eq!(p.threshold, 0.75);
        assert!(p.hard_fail);
        assert!(p.skipped.is_empty());
    }

    #[test]
    fn test_lenient_plan_makes_validate_and_generate_optional() {
        let p = plan(RunMode::Lenient);
        assert!(!p.is_required(StepName::Validate));
        assert!(!p.is_required(StepName::Generate));
        assert!(p.is_required(StepName::Fetch));
        assert!(p.is_required(StepName::EmitLedger));
        assert_eq!(p.threshold, 0.5);
        assert!(!p.hard_fail);
    }

    #[test]
    fn test_strictness_flag_forces_hard_fail() {
        let options = RunOptions::new("AAPL", 2023, RunMode::Lenient).with_strict_validation(true);
        let p = WorkflowPlanner::default().plan(&options);
        assert!(p.hard_fail);
        assert!(!p.is_required(StepName::Validate));
    }

    #[test]
    fn test_skip_set_ignored_in_strict_mode() {
        let p = plan(RunMode::Strict).with_skipped([StepName::Validate]);
        assert!(p.skipped.is_empty());
    }

    #[test]
    fn test_emit_ledger_never_skippable() {
        let p = plan(RunMode::Lenient).with_skipped([StepName::Generate, StepName::EmitLedger]);
        assert_eq!(p.skipped, BTreeSet::from([StepName::Generate]));
    }

    #[test]
    fn test_threshold_override() {
        let p = plan(RunMode::Strict).with_threshold(0.6).expect("in range");
        assert_eq!(p.threshold, 0.6);
        assert!(plan(RunMode::Strict).with_threshold(-0.1).is_err());
    }

    #[test]
    fn test_policy_rejects_inverted_thresholds() {
        assert!(PlannerPolicy::new(0.4, 0.6).is_err());
        assert!(PlannerPolicy::new(1.2, 0.5).is_err());
        assert!(PlannerPolicy::new(0.6, 0.6).is_ok());
    }

    #[test]
    fn test_plan_serializes_camel_case() {
        let raw = serde_json::to_value(plan(RunMode::Lenient).with_skipped([StepName::Validate]))
            .expect("serialize plan");
        assert_eq!(raw["mode"], "intent");
        assert_eq!(raw["hardFail"], false);
        assert_eq!(raw["skipped"][0], "validate");
        assert_eq!(raw["steps"][2]["name"], "locate_sections");
    }
}

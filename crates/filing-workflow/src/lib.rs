//! Filing Workflow
//!
//! Runs the filing analysis under an auditable step contract:
//! - `planner`: options to an ordered plan with required flags and a threshold
//! - `orchestrator`: sequential execution with command/intent enforcement
//! - `ledger`: pure reconciliation of what ran into the audit ledger
//! - `router`: pluggable skip deciders feeding the plan's skip set

pub mod ledger;
pub mod orchestrator;
pub mod planner;
pub mod router;
pub mod steps;

pub use ledger::{LedgerBuilder, RunOutcome};
pub use orchestrator::{remediation_hints, Orchestrator, RunExit, RunReport};
pub use planner::{PlannedStep, PlannerPolicy, WorkflowPlan, WorkflowPlanner};
pub use router::{FixedSkip, NoSkip, ProbabilisticSkip, SkipDecider, SkipProbabilities};
pub use steps::{FilingSteps, StepExecutor, MIN_DOCUMENT_CHARS};

//! Domain models for filing analysis.
//!
//! Canonical definitions for the core entities:
//! - `RunOptions` / `RunContext`: one run's inputs and mutable state
//! - `StepName` / `StepResult`: the fixed step universe and per-step outcomes
//! - `SectionMatch` / `SectionAnalysis`: locator and summarizer outputs
//! - `AuditLedger` / `AnalysisArtifact`: the two run artifacts

pub mod document;
pub mod error;
pub mod ledger;
pub mod run;
pub mod section;
pub mod step;

// Re-export main types and errors
pub use document::{ContentKind, FetchedDocument};
pub use error::{FilingError, Result, SectionFailure, ValidationFailure};
pub use ledger::{AnalysisArtifact, AnalysisInput, AuditLedger, SectionSnapshot, WORKFLOW_ID};
pub use run::{RunContext, RunMode, RunOptions};
pub use section::{SectionAnalysis, SectionKey, SectionMatch};
pub use step::{StepName, StepResult, StepState, StepStatus};

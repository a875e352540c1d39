//! Filing Core
//!
//! Section analysis for regulatory filings: locate the risk factor, MD&A and
//! financial statement sections, validate them against confidence and length
//! thresholds, and summarize what was found.
//!
//! The workflow that sequences these operations lives in `filing-workflow`.

pub mod config;
pub mod domain;
pub mod fakes;
pub mod locate;
pub mod obs;
pub mod reporting;
pub mod source;
pub mod summarize;
pub mod telemetry;
pub mod validate;

pub use config::AnalysisConfig;
pub use domain::{
    AnalysisArtifact, AnalysisInput, AuditLedger, ContentKind, FetchedDocument, FilingError,
    Result, RunContext, RunMode, RunOptions, SectionAnalysis, SectionFailure, SectionKey,
    SectionMatch, SectionSnapshot, StepName, StepResult, StepState, StepStatus,
    ValidationFailure, WORKFLOW_ID,
};
pub use locate::{LocatorConfig, SectionLocator};
pub use obs::{
    emit_ledger_emitted, emit_run_finished, emit_run_halted, emit_run_started,
    emit_step_finished, run_span, RunSpan,
};
pub use reporting::{render_analysis_md, ArtifactSink, FsArtifactSink};
pub use source::{DocumentFetcher, FileFetcher, HttpFetcher, PreExtractedText, RateLimiter, TextExtractor};
pub use summarize::{Summarizer, Summary};
pub use validate::{Escalation, SectionValidator, ValidationReport};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

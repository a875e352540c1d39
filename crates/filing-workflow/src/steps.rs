//! Units of work bound to step names.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use filing_core::domain::{
    ContentKind, FetchedDocument, FilingError, Result, RunContext, RunOptions, StepName,
};
use filing_core::locate::SectionLocator;
use filing_core::source::{DocumentFetcher, TextExtractor};
use filing_core::summarize::Summarizer;
use filing_core::validate::{Escalation, SectionValidator};

use crate::planner::WorkflowPlan;

/// Documents with less extracted text than this are rejected as malformed.
pub const MIN_DOCUMENT_CHARS: usize = 200;

/// Executes the work behind a step against the run's context.
///
/// `emit_ledger` is owned by the orchestrator and never reaches an executor.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn execute(
        &self,
        step: StepName,
        ctx: &mut RunContext,
        options: &RunOptions,
        plan: &WorkflowPlan,
    ) -> Result<()>;
}

/// Production executor: fetch, extract, locate, validate, summarize.
pub struct FilingSteps {
    fetcher: Arc<dyn DocumentFetcher>,
    extractor: Option<Arc<dyn TextExtractor>>,
    locator: SectionLocator,
    validator: SectionValidator,
    summarizer: Summarizer,
}

impl FilingSteps {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>) -> Result<Self> {
        Ok(Self {
            fetcher,
            extractor: None,
            locator: SectionLocator::with_defaults()?,
            validator: SectionValidator::default(),
            summarizer: Summarizer::new()?,
        })
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn with_locator(mut self, locator: SectionLocator) -> Self {
        self.locator = locator;
        self
    }

    pub fn with_validator(mut self, validator: SectionValidator) -> Self {
        self.validator = validator;
        self
    }

    async fn fetch(&self, ctx: &mut RunContext, options: &RunOptions) -> Result<()> {
        let document = self.fetcher.fetch(&options.ticker, options.year).await?;
        info!(
            source = %document.source,
            kind = ?document.kind,
            bytes = document.content.len(),
            digest = %document.digest(),
            "Fetched filing"
        );
        ctx.document = Some(document);
        Ok(())
    }

    fn extract(&self, ctx: &mut RunContext) -> Result<()> {
        let document = fetched(ctx, StepName::Extract)?;
        let text = match document.kind {
            ContentKind::Markup => self.locator.splitter().to_text(&document.text_lossy()),
            ContentKind::PlainText => document.text_lossy(),
            ContentKind::Binary => match &self.extractor {
                Some(extractor) => extractor.extract(document)?,
                None => {
                    return Err(FilingError::Extraction(format!(
                        "no text extractor configured for binary document {}",
                        document.source
                    )))
                }
            },
        };

        let chars = text.trim().chars().count();
        if chars < MIN_DOCUMENT_CHARS {
            return Err(FilingError::Input(format!(
                "extracted text has {} characters, need at least {}",
                chars, MIN_DOCUMENT_CHARS
            )));
        }
        debug!(chars, "Extracted document text");
        ctx.text = text;
        Ok(())
    }

    fn locate(&self, ctx: &mut RunContext) -> Result<()> {
        let document = fetched(ctx, StepName::LocateSections)?;
        let kind = document.kind;
        let sections = match kind {
            ContentKind::Markup => self.locator.locate(&document.text_lossy(), &ctx.text, kind),
            ContentKind::Binary | ContentKind::PlainText => {
                if ctx.text.is_empty() {
                    return Err(FilingError::Step {
                        step: StepName::LocateSections,
                        message: "no extracted text to search".to_string(),
                    });
                }
                self.locator.locate_text(&ctx.text)
            }
        };
        for section in &sections {
            debug!(
                section = %section.key,
                found = section.found,
                confidence = section.confidence,
                chars = section.length_chars,
                "Located section"
            );
        }
        ctx.sections = sections;
        Ok(())
    }

    fn validate(&self, ctx: &mut RunContext, options: &RunOptions, plan: &WorkflowPlan) -> Result<()> {
        let escalation = self.validator.enforce(
            &ctx.sections,
            &options.required_sections,
            plan.threshold,
            plan.hard_fail,
        )?;
        if let Escalation::Warning(message) = escalation {
            ctx.warnings.push(message);
        }
        Ok(())
    }

    fn generate(&self, ctx: &mut RunContext, options: &RunOptions) {
        let summary = self
            .summarizer
            .summarize(&ctx.sections, &options.resolved_sections());
        ctx.analyses = summary.sections;
        ctx.overall_summary = summary.overall;
    }
}

fn fetched(ctx: &RunContext, step: StepName) -> Result<&FetchedDocument> {
    ctx.document.as_ref().ok_or_else(|| FilingError::Step {
        step,
        message: "no document was fetched".to_string(),
    })
}

#[async_trait]
impl StepExecutor for FilingSteps {
    async fn execute(
        &self,
        step: StepName,
        ctx: &mut RunContext,
        options: &RunOptions,
        plan: &WorkflowPlan,
    ) -> Result<()> {
        match step {
            StepName::Fetch => self.fetch(ctx, options).await,
            StepName::Extract => self.extract(ctx),
            StepName::LocateSections => self.locate(ctx),
            StepName::Validate => self.validate(ctx, options, plan),
            StepName::Generate => {
                self.generate(ctx, options);
                Ok(())
            }
            StepName::EmitLedger => Err(FilingError::Step {
                step,
                message: "emit_ledger is run by the orchestrator".to_string(),
            }),
        }
    }
}

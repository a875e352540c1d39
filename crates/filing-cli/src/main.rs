//! Filing section analysis CLI
//!
//! The `filing` command runs the section workflow over one filing.
//!
//! ## Commands
//!
//! - `run`: fetch, locate, validate and summarize; write the ledger and analysis
//! - `plan`: print the step plan for a set of options without executing it
//! - `locate`: print the sections found in a local document

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, Level};

use filing_core::domain::{ContentKind, RunMode, RunOptions, SectionKey, StepName};
use filing_core::source::{DocumentFetcher, FileFetcher, HttpFetcher, PreExtractedText, TextExtractor};
use filing_core::{
    AnalysisConfig, FetchedDocument, FsArtifactSink, SectionLocator, SectionMatch,
    SectionValidator,
};
use filing_workflow::{
    FilingSteps, FixedSkip, NoSkip, Orchestrator, PlannerPolicy, ProbabilisticSkip, RunExit,
    SkipDecider, WorkflowPlan, WorkflowPlanner,
};

#[derive(Parser)]
#[command(name = "filing")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Locate, validate and summarize sections of annual filings", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full workflow and write its artifacts
    Run {
        #[command(flatten)]
        plan: PlanArgs,

        /// Local filing document (.htm/.html markup, .pdf, or plain text)
        #[arg(long, required_unless_present = "url", conflicts_with = "url")]
        input: Option<PathBuf>,

        /// Remote filing URL; `{ticker}` and `{year}` are substituted
        #[arg(long)]
        url: Option<String>,

        /// Pre-extracted text for binary documents
        #[arg(long)]
        text: Option<PathBuf>,

        /// Artifact root directory (default: $FILING_OUTPUT_DIR or .filing/runs)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the step plan as JSON without executing it
    Plan {
        #[command(flatten)]
        plan: PlanArgs,
    },

    /// Print the sections located in a local document
    Locate {
        /// Document to scan
        #[arg(long)]
        input: PathBuf,

        /// Pre-extracted text for binary documents
        #[arg(long)]
        text: Option<PathBuf>,
    },
}

/// Options shared by `run` and `plan`.
#[derive(Args)]
struct PlanArgs {
    /// Company ticker
    #[arg(long)]
    ticker: String,

    /// Filing year
    #[arg(long)]
    year: u16,

    /// command (strict, every step enforced) or intent (best effort)
    #[arg(long, default_value = "command")]
    mode: RunMode,

    /// Required sections, comma separated (aliases accepted)
    #[arg(long, value_delimiter = ',')]
    sections: Vec<String>,

    /// Escalate validation failures to errors even in intent mode
    #[arg(long)]
    strict_validation: bool,

    /// Steps to skip in intent mode, comma separated
    #[arg(long, value_delimiter = ',')]
    skip: Vec<StepName>,

    /// Seed for probabilistic skipping of validate/generate in intent mode
    #[arg(long, conflicts_with = "skip")]
    skip_seed: Option<u64>,

    /// Confidence threshold override
    #[arg(long)]
    threshold: Option<f64>,
}

impl PlanArgs {
    fn options(&self) -> RunOptions {
        let options = RunOptions::new(&self.ticker, self.year, self.mode)
            .with_strict_validation(self.strict_validation);
        if self.sections.is_empty() {
            options
        } else {
            options.with_sections(self.sections.iter().cloned())
        }
    }

    fn plan(&self, options: &RunOptions, config: &AnalysisConfig) -> Result<WorkflowPlan> {
        let policy = PlannerPolicy::from_config(config).context("invalid threshold configuration")?;
        let mut decider: Box<dyn SkipDecider> = match (self.skip.is_empty(), self.skip_seed) {
            (false, _) => Box::new(FixedSkip::new(self.skip.iter().copied())),
            (true, Some(seed)) => Box::new(ProbabilisticSkip::with_seed(seed)),
            (true, None) => Box::new(NoSkip),
        };
        let plan = WorkflowPlanner::new(policy)
            .plan(options)
            .with_skipped(decider.decide(options));
        match self.threshold {
            Some(threshold) => Ok(plan.with_threshold(threshold)?),
            None => Ok(plan),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    filing_core::telemetry::init_tracing(cli.json, level);

    let config = AnalysisConfig::from_env();
    let outcome = match cli.command {
        Commands::Run {
            plan,
            input,
            url,
            text,
            out,
        } => {
            cmd_run(
                &plan,
                input.as_deref(),
                url.as_deref(),
                text.as_deref(),
                out,
                &config,
            )
            .await
        }
        Commands::Plan { plan } => cmd_plan(&plan, &config),
        Commands::Locate { input, text } => cmd_locate(&input, text.as_deref()).await,
    };

    match outcome {
        Ok(exit) => ExitCode::from(exit.exit_code() as u8),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(RunExit::Failure.exit_code() as u8)
        }
    }
}

async fn cmd_run(
    args: &PlanArgs,
    input: Option<&Path>,
    url: Option<&str>,
    text: Option<&Path>,
    out: Option<PathBuf>,
    config: &AnalysisConfig,
) -> Result<RunExit> {
    let options = args.options();
    let plan = args.plan(&options, config)?;

    let fetcher: Arc<dyn DocumentFetcher> = match (input, url) {
        (Some(path), _) => Arc::new(FileFetcher::new(path)),
        (None, Some(url)) => Arc::new(
            HttpFetcher::new(url, &config.user_agent, config.fetch_interval())
                .context("failed to build HTTP fetcher")?,
        ),
        (None, None) => bail!("one of --input or --url is required"),
    };

    let mut steps = FilingSteps::new(fetcher)
        .context("failed to compile section patterns")?
        .with_validator(SectionValidator::new(config.min_section_chars));
    if let Some(path) = text {
        let extracted = PreExtractedText::from_file(path)
            .await
            .with_context(|| format!("failed to read extracted text {:?}", path))?;
        steps = steps.with_extractor(Arc::new(extracted));
    }

    let sink = FsArtifactSink::new(out.unwrap_or_else(|| config.output_dir.clone()));
    info!(invocation_id = %options.invocation_id, mode = %options.mode, "Starting filing run");

    let report = Orchestrator::run(&options, &plan, &steps, &sink)
        .await
        .context("failed to emit run artifacts")?;

    let ledger = &report.ledger;
    println!("Invocation: {}", ledger.invocation_id);
    println!("Mode: {}", ledger.mode);
    println!("Status: {}", if ledger.passed { "✓ PASSED" } else { "✗ FAILED" });
    println!("Executed: {}", join_steps(&ledger.executed_steps));
    if !ledger.skipped_steps.is_empty() {
        println!("Skipped: {}", join_steps(&ledger.skipped_steps));
    }
    if !report.failed_optional.is_empty() {
        println!("Failed (optional): {}", join_steps(&report.failed_optional));
    }
    println!();
    for key in SectionKey::ALL {
        if let Some(snapshot) = ledger.section_validation.get(&key) {
            let mark = if snapshot.found { "✓" } else { "✗" };
            println!(
                "  {} {} (confidence {:.2}, {} chars)",
                mark, key, snapshot.confidence, snapshot.length_chars
            );
        }
    }
    for warning in &report.warnings {
        println!("Warning: {}", warning);
    }
    if let Some(reason) = &ledger.failure_reason {
        println!();
        println!("Failure: {}", reason);
    }
    if !report.hints.is_empty() {
        println!("Hints:");
        for hint in &report.hints {
            println!("  - {}", hint);
        }
    }
    println!();
    println!("Artifacts: {}", sink.run_dir(ledger.invocation_id).display());

    Ok(report.exit)
}

fn cmd_plan(args: &PlanArgs, config: &AnalysisConfig) -> Result<RunExit> {
    let options = args.options();
    let plan = args.plan(&options, config)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&plan).context("serialize plan")?
    );
    Ok(RunExit::Success)
}

/// Compact view of a match; content is summarized by its length.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LocatedSection {
    section: SectionKey,
    found: bool,
    confidence: f64,
    start: Option<usize>,
    end: Option<usize>,
    length_chars: usize,
}

impl From<&SectionMatch> for LocatedSection {
    fn from(m: &SectionMatch) -> Self {
        Self {
            section: m.key,
            found: m.found,
            confidence: m.confidence,
            start: m.start,
            end: m.end,
            length_chars: m.length_chars,
        }
    }
}

async fn cmd_locate(input: &Path, text: Option<&Path>) -> Result<RunExit> {
    let raw = tokio::fs::read(input)
        .await
        .with_context(|| format!("failed to read {:?}", input))?;
    let document = FetchedDocument::new(raw, ContentKind::from_path(input), input.display().to_string());
    let locator = SectionLocator::with_defaults().context("failed to compile section patterns")?;

    let source = document.text_lossy();
    let sections = match document.kind {
        ContentKind::Markup => locator.locate_markup(&source),
        ContentKind::PlainText => locator.locate_text(&source),
        ContentKind::Binary => {
            let Some(path) = text else {
                bail!("{:?} is a binary document; supply its text with --text", input);
            };
            let extracted = PreExtractedText::from_file(path)
                .await?
                .extract(&document)?;
            locator.locate_text(&extracted)
        }
    };

    let view: Vec<LocatedSection> = sections.iter().map(LocatedSection::from).collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&view).context("serialize sections")?
    );
    Ok(RunExit::Success)
}

fn join_steps(steps: &[StepName]) -> String {
    steps
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

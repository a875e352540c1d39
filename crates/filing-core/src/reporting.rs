//! Run artifact persistence and Markdown rendering.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::domain::{AnalysisArtifact, AuditLedger, FilingError, Result};

pub const LEDGER_FILE: &str = "ledger.json";
pub const ANALYSIS_FILE: &str = "analysis.json";
pub const ANALYSIS_MD_FILE: &str = "analysis.md";

/// Receives the artifacts of one run.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn write_ledger(&self, ledger: &AuditLedger) -> Result<()>;

    async fn write_analysis(&self, analysis: &AnalysisArtifact) -> Result<()>;
}

/// Writes artifacts under `<root>/<invocation id>/`.
#[derive(Debug, Clone)]
pub struct FsArtifactSink {
    root: PathBuf,
}

impl FsArtifactSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn run_dir(&self, invocation_id: Uuid) -> PathBuf {
        self.root.join(invocation_id.to_string())
    }

    async fn ensure_dir(&self, invocation_id: Uuid) -> Result<PathBuf> {
        let dir = self.run_dir(invocation_id);
        tokio::fs::create_dir_all(&dir).await?;
        Ok(dir)
    }
}

#[async_trait]
impl ArtifactSink for FsArtifactSink {
    async fn write_ledger(&self, ledger: &AuditLedger) -> Result<()> {
        let dir = self.ensure_dir(ledger.invocation_id).await?;
        let path = dir.join(LEDGER_FILE);
        write_json(&path, ledger).await?;
        info!(path = %path.display(), "Wrote audit ledger");
        Ok(())
    }

    async fn write_analysis(&self, analysis: &AnalysisArtifact) -> Result<()> {
        let dir = self.ensure_dir(analysis.invocation_id).await?;
        let path = dir.join(ANALYSIS_FILE);
        write_json(&path, analysis).await?;
        let md_path = dir.join(ANALYSIS_MD_FILE);
        tokio::fs::write(&md_path, render_analysis_md(analysis)).await?;
        info!(path = %path.display(), "Wrote analysis artifact");
        Ok(())
    }
}

async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, content)
        .await
        .map_err(|e| FilingError::Io(std::io::Error::new(e.kind(), format!("write {}: {}", path.display(), e))))
}

/// Render the analysis for human review.
pub fn render_analysis_md(analysis: &AnalysisArtifact) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "# {} {} Filing Analysis\n\n",
        analysis.input.ticker, analysis.input.year
    ));
    out.push_str(&format!(
        "- invocation: `{}`\n- mode: {}\n- workflow: {}\n\n",
        analysis.invocation_id, analysis.mode, analysis.workflow
    ));

    out.push_str("## Overview\n");
    for line in &analysis.overall_summary {
        out.push_str(&format!("- {}\n", line));
    }
    out.push('\n');

    for section in &analysis.sections {
        out.push_str(&format!("## {}\n", section.section));
        if !section.found {
            out.push_str("_Not found._\n\n");
            continue;
        }
        out.push_str(&format!("Confidence: {:.2}\n\n", section.confidence));
        if !section.summary.is_empty() {
            out.push_str("### Summary\n");
            for sentence in &section.summary {
                out.push_str(&format!("- {}\n", sentence));
            }
            out.push('\n');
        }
        if !section.evidence.is_empty() {
            out.push_str("### Evidence\n");
            for snippet in &section.evidence {
                out.push_str(&format!("> {}\n\n", snippet));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnalysisInput, RunMode, SectionAnalysis, SectionKey, WORKFLOW_ID};

    fn analysis() -> AnalysisArtifact {
        AnalysisArtifact {
            invocation_id: Uuid::new_v4(),
            mode: RunMode::Lenient,
            workflow: WORKFLOW_ID.to_string(),
            input: AnalysisInput {
                ticker: "AAPL".to_string(),
                year: 2023,
            },
            sections: vec![
                SectionAnalysis {
                    section: SectionKey::Mdna,
                    found: true,
                    confidence: 0.95,
                    summary: vec!["Revenue increased.".to_string()],
                    evidence: vec!["Revenue increased.".to_string()],
                },
                SectionAnalysis::placeholder(SectionKey::RiskFactors),
            ],
            overall_summary: vec!["Sections found: mdna".to_string()],
        }
    }

    #[test]
    fn test_render_analysis_md() {
        let md = render_analysis_md(&analysis());
        assert!(md.starts_with("# AAPL 2023 Filing Analysis"));
        assert!(md.contains("- mode: intent"));
        assert!(md.contains("## mdna\nConfidence: 0.95"));
        assert!(md.contains("## risk_factors\n_Not found._"));
        assert!(md.contains("> Revenue increased."));
    }

    #[tokio::test]
    async fn test_fs_sink_writes_run_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = FsArtifactSink::new(dir.path());
        let artifact = analysis();

        sink.write_analysis(&artifact).await.expect("write analysis");

        let run_dir = sink.run_dir(artifact.invocation_id);
        let raw = std::fs::read_to_string(run_dir.join(ANALYSIS_FILE)).expect("read json");
        let parsed: AnalysisArtifact = serde_json::from_str(&raw).expect("parse json");
        assert_eq!(parsed, artifact);
        assert!(run_dir.join(ANALYSIS_MD_FILE).exists());
        assert!(!run_dir.join(LEDGER_FILE).exists());
    }
}

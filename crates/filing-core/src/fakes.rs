//! In-memory collaborators (testing only)
//!
//! `StaticFetcher` serves a fixed document and `MemoryArtifactSink` keeps the
//! artifacts it receives, so workflow tests need neither disk nor network.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::{AnalysisArtifact, AuditLedger, ContentKind, FetchedDocument, FilingError, Result};
use crate::reporting::ArtifactSink;
use crate::source::DocumentFetcher;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// StaticFetcher
// ---------------------------------------------------------------------------

/// Serves one document for every request, or fails every request.
#[derive(Debug)]
pub struct StaticFetcher {
    document: Option<FetchedDocument>,
    calls: Mutex<u32>,
}

impl StaticFetcher {
    pub fn new(document: FetchedDocument) -> Self {
        Self {
            document: Some(document),
            calls: Mutex::new(0),
        }
    }

    pub fn markup(content: &str) -> Self {
        Self::new(FetchedDocument::new(content.as_bytes(), ContentKind::Markup, "static"))
    }

    pub fn text(content: &str) -> Self {
        Self::new(FetchedDocument::new(content.as_bytes(), ContentKind::PlainText, "static"))
    }

    /// A fetcher whose every request fails.
    pub fn unavailable() -> Self {
        Self {
            document: None,
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        *lock(&self.calls)
    }
}

#[async_trait]
impl DocumentFetcher for StaticFetcher {
    async fn fetch(&self, ticker: &str, year: u16) -> Result<FetchedDocument> {
        *lock(&self.calls) += 1;
        self.document
            .clone()
            .ok_or_else(|| FilingError::Fetch(format!("no filing available for {} {}", ticker, year)))
    }
}

// ---------------------------------------------------------------------------
// MemoryArtifactSink
// ---------------------------------------------------------------------------

/// Records every artifact written to it.
#[derive(Debug, Default)]
pub struct MemoryArtifactSink {
    ledgers: Mutex<Vec<AuditLedger>>,
    analyses: Mutex<Vec<AnalysisArtifact>>,
}

impl MemoryArtifactSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ledgers(&self) -> Vec<AuditLedger> {
        lock(&self.ledgers).clone()
    }

    pub fn analyses(&self) -> Vec<AnalysisArtifact> {
        lock(&self.analyses).clone()
    }
}

#[async_trait]
impl ArtifactSink for MemoryArtifactSink {
    async fn write_ledger(&self, ledger: &AuditLedger) -> Result<()> {
        lock(&self.ledgers).push(ledger.clone());
        Ok(())
    }

    async fn write_analysis(&self, analysis: &AnalysisArtifact) -> Result<()> {
        lock(&self.analyses).push(analysis.clone());
        Ok(())
    }
}

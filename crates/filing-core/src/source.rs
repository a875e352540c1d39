//! Document fetching and text extraction collaborators.
//!
//! The workflow only sees the [`DocumentFetcher`] and [`TextExtractor`]
//! traits. Transport details, including request throttling, stay inside the
//! implementing type.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::domain::{ContentKind, FetchedDocument, FilingError, Result};

/// Supplies the raw filing for a ticker and year.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, ticker: &str, year: u16) -> Result<FetchedDocument>;
}

/// Produces plain text from a binary document.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, document: &FetchedDocument) -> Result<String>;
}

/// Reads a filing from the local filesystem.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    path: PathBuf,
}

impl FileFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DocumentFetcher for FileFetcher {
    async fn fetch(&self, ticker: &str, year: u16) -> Result<FetchedDocument> {
        let content = tokio::fs::read(&self.path).await.map_err(|e| {
            FilingError::Fetch(format!("read {}: {}", self.path.display(), e))
        })?;
        let kind = ContentKind::from_path(&self.path);
        debug!(ticker = %ticker, year, path = %self.path.display(), bytes = content.len(), "Read filing from disk");
        Ok(FetchedDocument::new(
            content,
            kind,
            self.path.display().to_string(),
        ))
    }
}

/// Enforces a minimum interval between outbound requests of one fetcher.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Wait until the interval since the previous request has elapsed.
    pub async fn wait_if_needed(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "Rate limiting outbound fetch");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Fetches a filing over HTTP(S).
///
/// The URL may contain `{ticker}` and `{year}` placeholders.
pub struct HttpFetcher {
    client: reqwest::Client,
    url_template: String,
    limiter: RateLimiter,
}

impl HttpFetcher {
    pub fn new(url_template: impl Into<String>, user_agent: &str, min_interval: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| FilingError::Fetch(format!("build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url_template: url_template.into(),
            limiter: RateLimiter::new(min_interval),
        })
    }

    pub fn url_for(&self, ticker: &str, year: u16) -> String {
        self.url_template
            .replace("{ticker}", ticker)
            .replace("{year}", &year.to_string())
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, ticker: &str, year: u16) -> Result<FetchedDocument> {
        let url = self.url_for(ticker, year);
        self.limiter.wait_if_needed().await;
        info!(url = %url, "Fetching filing");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FilingError::Fetch(format!("GET {}: {}", url, e)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FilingError::Fetch(format!("GET {}: HTTP {}", url, status)));
        }
        let kind = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ContentKind::from_mime)
            .unwrap_or(ContentKind::PlainText);
        let body = response
            .bytes()
            .await
            .map_err(|e| FilingError::Fetch(format!("read body of {}: {}", url, e)))?;

        Ok(FetchedDocument::new(body.to_vec(), kind, url))
    }
}

/// Serves text extracted ahead of time by an external tool.
#[derive(Debug, Clone)]
pub struct PreExtractedText {
    text: String,
}

impl PreExtractedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub async fn from_file(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            FilingError::Extraction(format!("read {}: {}", path.display(), e))
        })?;
        Ok(Self { text })
    }
}

impl TextExtractor for PreExtractedText {
    fn extract(&self, _document: &FetchedDocument) -> Result<String> {
        Ok(self.text.clone())
    }
}

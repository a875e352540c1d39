//! Fetched source documents and their content kinds.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// What the fetched payload is, which decides how text is extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// HTML / XHTML / XML markup, located block by block.
    Markup,
    /// A binary format (e.g. PDF) whose text is extracted externally.
    Binary,
    /// Plain text, located line by line.
    PlainText,
}

impl ContentKind {
    /// Infer the content kind from a file extension.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "htm" | "html" | "xhtml" | "xml" => ContentKind::Markup,
            "pdf" => ContentKind::Binary,
            _ => ContentKind::PlainText,
        }
    }

    /// Infer the content kind from an HTTP `Content-Type` header value.
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.to_ascii_lowercase();
        if mime.contains("html") || mime.contains("xml") {
            ContentKind::Markup
        } else if mime.contains("pdf") || mime.contains("octet-stream") {
            ContentKind::Binary
        } else {
            ContentKind::PlainText
        }
    }
}

/// Raw document as delivered by a fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    pub content: Vec<u8>,
    pub kind: ContentKind,
    /// Where the document came from (path or URL), for logging.
    pub source: String,
}

impl FetchedDocument {
    pub fn new(content: impl Into<Vec<u8>>, kind: ContentKind, source: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind,
            source: source.into(),
        }
    }

    /// SHA-256 hex digest of the raw payload.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.content);
        hex::encode(hasher.finalize())
    }

    /// Payload decoded as UTF-8, replacing invalid sequences.
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }
}

//! Splits HTML-like markup into top-level text blocks.
//!
//! Block boundaries are block-level tags; inline tags are stripped and
//! entities decoded. Each block keeps the byte offset where it starts in the
//! raw markup so section spans point back into the source.

use regex::{Captures, Regex};

use super::Unit;
use crate::domain::Result;

const BLOCK_TAGS: &str = r"(?i)<\s*/?\s*(?:p|div|h[1-6]|tr|li|ul|ol|table|thead|tbody|section|article|header|footer|br|hr|title|body|html|center|blockquote|pre|dl|dt|dd)\b[^>]*>";
const INLINE_TAG: &str = r"<[^>]*>";
const ENTITY: &str = r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);";
const SCRIPT: &str = r"(?is)<script\b.*?</script\s*>";
const STYLE: &str = r"(?is)<style\b.*?</style\s*>";
const COMMENT: &str = r"(?s)<!--.*?-->";

/// Compiled regexes for markup block extraction.
#[derive(Debug, Clone)]
pub struct MarkupSplitter {
    block_tags: Regex,
    inline_tag: Regex,
    entity: Regex,
    hidden: Vec<Regex>,
}

impl MarkupSplitter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            block_tags: Regex::new(BLOCK_TAGS)?,
            inline_tag: Regex::new(INLINE_TAG)?,
            entity: Regex::new(ENTITY)?,
            hidden: vec![
                Regex::new(SCRIPT)?,
                Regex::new(STYLE)?,
                Regex::new(COMMENT)?,
            ],
        })
    }

    /// Non-empty text blocks in document order.
    pub fn blocks(&self, markup: &str) -> Vec<Unit> {
        let visible = self.blank_hidden(markup);
        let mut units = Vec::new();
        let mut cursor = 0usize;

        for tag in self.block_tags.find_iter(&visible) {
            self.push_block(&visible, cursor, tag.start(), &mut units);
            cursor = tag.end();
        }
        self.push_block(&visible, cursor, visible.len(), &mut units);
        units
    }

    /// Render a fragment of markup as normalized plain text.
    pub fn render(&self, fragment: &str) -> String {
        let stripped = self.inline_tag.replace_all(fragment, " ");
        let decoded = self.decode_entities(&stripped);
        normalize_whitespace(&decoded)
    }

    /// Plain text of the whole document, one block per line.
    pub fn to_text(&self, markup: &str) -> String {
        self.blocks(markup)
            .into_iter()
            .map(|u| u.text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn push_block(&self, visible: &str, start: usize, end: usize, units: &mut Vec<Unit>) {
        if start >= end {
            return;
        }
        let text = self.render(&visible[start..end]);
        if !text.is_empty() {
            units.push(Unit { text, start });
        }
    }

    // Script, style and comment bodies are replaced by spaces of equal byte
    // length so offsets into the original markup stay valid.
    fn blank_hidden(&self, markup: &str) -> String {
        let mut out = markup.to_string();
        for re in &self.hidden {
            let ranges: Vec<(usize, usize)> =
                re.find_iter(&out).map(|m| (m.start(), m.end())).collect();
            for (start, end) in ranges {
                out.replace_range(start..end, &" ".repeat(end - start));
            }
        }
        out
    }

    fn decode_entities(&self, text: &str) -> String {
        self.entity
            .replace_all(text, |caps: &Captures| {
                let name = &caps[1];
                decode_entity(name).unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

fn decode_entity(name: &str) -> Option<String> {
    if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        return u32::from_str_radix(hex, 16)
            .ok()
            .and_then(char::from_u32)
            .map(|c| (if c == '\u{a0}' { ' ' } else { c }).to_string());
    }
    if let Some(dec) = name.strip_prefix('#') {
        return dec
            .parse::<u32>()
            .ok()
            .and_then(char::from_u32)
            .map(|c| (if c == '\u{a0}' { ' ' } else { c }).to_string());
    }
    let decoded = match name {
        "nbsp" | "ensp" | "emsp" | "thinsp" => " ",
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "rsquo" => "\u{2019}",
        "lsquo" => "\u{2018}",
        "rdquo" => "\u{201d}",
        "ldquo" => "\u{201c}",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "bull" => "\u{2022}",
        "sect" => "\u{a7}",
        _ => return None,
    };
    Some(decoded.to_string())
}

/// Collapse every whitespace run (including non-breaking spaces) to one space.
pub fn normalize_whitespace(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

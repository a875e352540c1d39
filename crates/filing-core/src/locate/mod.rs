//! Section location by heading-pattern heuristics.
//!
//! Both input shapes reduce to an ordered list of [`Unit`]s (markup blocks or
//! text lines) that are scanned the same way:
//!
//! 1. A short unit matching one of a section's heading patterns is a
//!    candidate. The index of the first matching pattern is its tier.
//! 2. Content runs from the unit after the heading up to the first unit
//!    matching the generic boundary heading (`Item 7.`, `PART II`, ...).
//! 3. Among candidates (a table of contents repeats every heading) the one
//!    with substantial content in the best tier wins, longest first.

pub mod markup;
pub mod patterns;
pub mod text;

use regex::Regex;
use tracing::debug;

use crate::domain::{ContentKind, Result, SectionMatch};
use markup::{normalize_whitespace, MarkupSplitter};
use patterns::{default_pattern_specs, PatternSpec, SectionPattern, BOUNDARY_HEADING};

/// Longest unit, in characters, that can still be a heading.
pub const HEADING_MAX_CHARS: usize = 200;

/// Flat-text sections stop after this many lines.
pub const MAX_SECTION_LINES: usize = 2_000;

/// Hard cap on extracted section content.
pub const MAX_SECTION_CHARS: usize = 100_000;

/// Units right after a heading that may repeat its wording without closing it.
pub const HEADING_ECHO_UNITS: usize = 2;

/// Candidates shorter than this lose to any longer candidate (table of contents rows).
const SUBSTANTIAL_CONTENT_CHARS: usize = 200;

/// One block or line of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub text: String,
    /// Byte offset of the unit in the source it was cut from.
    pub start: usize,
}

/// Locator configuration.
#[derive(Debug, Clone)]
pub struct LocatorConfig {
    pub patterns: Vec<PatternSpec>,
    pub boundary_heading: String,
    pub heading_max_chars: usize,
    pub max_section_lines: usize,
    pub max_section_chars: usize,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            patterns: default_pattern_specs(),
            boundary_heading: BOUNDARY_HEADING.to_string(),
            heading_max_chars: HEADING_MAX_CHARS,
            max_section_lines: MAX_SECTION_LINES,
            max_section_chars: MAX_SECTION_CHARS,
        }
    }
}

struct ScanLimits {
    max_units: Option<usize>,
}

#[derive(Debug)]
struct Candidate {
    tier: usize,
    start: usize,
    end: usize,
    content: String,
}

impl Candidate {
    fn rank(&self) -> (bool, std::cmp::Reverse<usize>, usize) {
        let len = self.content.chars().count();
        (
            len >= SUBSTANTIAL_CONTENT_CHARS,
            std::cmp::Reverse(self.tier),
            len,
        )
    }
}

/// Finds the configured sections in a document.
#[derive(Debug, Clone)]
pub struct SectionLocator {
    patterns: Vec<SectionPattern>,
    boundary: Regex,
    splitter: MarkupSplitter,
    heading_max_chars: usize,
    max_section_lines: usize,
    max_section_chars: usize,
}

impl SectionLocator {
    pub fn new(config: LocatorConfig) -> Result<Self> {
        let patterns = config
            .patterns
            .iter()
            .map(SectionPattern::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            patterns,
            boundary: Regex::new(&config.boundary_heading)?,
            splitter: MarkupSplitter::new()?,
            heading_max_chars: config.heading_max_chars,
            max_section_lines: config.max_section_lines,
            max_section_chars: config.max_section_chars,
        })
    }

    /// Locator with the default annual-report patterns.
    pub fn with_defaults() -> Result<Self> {
        Self::new(LocatorConfig::default())
    }

    pub fn splitter(&self) -> &MarkupSplitter {
        &self.splitter
    }

    /// One match per configured pattern, in configuration order.
    ///
    /// Markup is scanned block by block over `source`; every other kind is
    /// scanned line by line over the extracted `text`.
    pub fn locate(&self, source: &str, text: &str, kind: ContentKind) -> Vec<SectionMatch> {
        match kind {
            ContentKind::Markup => self.locate_markup(source),
            ContentKind::Binary | ContentKind::PlainText => self.locate_text(text),
        }
    }

    pub fn locate_markup(&self, markup: &str) -> Vec<SectionMatch> {
        let units = self.splitter.blocks(markup);
        let limits = ScanLimits { max_units: None };
        self.scan_all(&units, markup.len(), &limits)
    }

    pub fn locate_text(&self, text: &str) -> Vec<SectionMatch> {
        let units = text::lines(text);
        let limits = ScanLimits {
            max_units: Some(self.max_section_lines),
        };
        self.scan_all(&units, text.len(), &limits)
    }

    fn scan_all(&self, units: &[Unit], source_len: usize, limits: &ScanLimits) -> Vec<SectionMatch> {
        self.patterns
            .iter()
            .map(|pattern| self.scan(pattern, units, source_len, limits))
            .collect()
    }

    fn scan(
        &self,
        pattern: &SectionPattern,
        units: &[Unit],
        source_len: usize,
        limits: &ScanLimits,
    ) -> SectionMatch {
        let mut best: Option<Candidate> = None;

        for idx in 0..units.len() {
            let Some((tier, body_start)) = self.classify_heading(pattern, units, idx) else {
                continue;
            };
            let candidate = self.collect(pattern, units, idx, tier, body_start, source_len, limits);
            debug!(
                section = %pattern.key,
                tier,
                offset = candidate.start,
                chars = candidate.content.len(),
                "Heading candidate"
            );
            let better = match &best {
                None => true,
                Some(current) => candidate.rank() > current.rank(),
            };
            if better {
                best = Some(candidate);
            }
        }

        match best {
            Some(c) => SectionMatch::found(
                pattern.key,
                SectionPattern::confidence_for(c.tier),
                c.start,
                c.end,
                c.content,
            ),
            None => SectionMatch::not_found(pattern.key),
        }
    }

    /// Tier and first body unit of a heading at `idx`, if it is one.
    ///
    /// A loose heading split over two units ("ITEM 1A." / "RISK FACTORS") is
    /// promoted to the canonical tier when the pair matches it.
    fn classify_heading(
        &self,
        pattern: &SectionPattern,
        units: &[Unit],
        idx: usize,
    ) -> Option<(usize, usize)> {
        let unit = &units[idx];
        if !self.is_heading_sized(&unit.text) {
            return None;
        }
        let tier = pattern.tier_of(&unit.text)?;
        if tier > 0 {
            if let Some(next) = units.get(idx + 1) {
                if self.is_heading_sized(&next.text) {
                    let joined = format!("{} {}", unit.text, next.text);
                    if pattern.tier_of(&joined) == Some(0) {
                        return Some((0, idx + 2));
                    }
                }
            }
        }
        Some((tier, idx + 1))
    }

    #[allow(clippy::too_many_arguments)]
    fn collect(
        &self,
        pattern: &SectionPattern,
        units: &[Unit],
        heading_idx: usize,
        tier: usize,
        body_start: usize,
        source_len: usize,
        limits: &ScanLimits,
    ) -> Candidate {
        let mut end_idx = units.len();
        for (j, unit) in units.iter().enumerate().skip(body_start) {
            if let Some(max) = limits.max_units {
                if j - body_start >= max {
                    end_idx = j;
                    break;
                }
            }
            if self.is_boundary(pattern, unit, j - body_start) {
                end_idx = j;
                break;
            }
        }

        let end = units.get(end_idx).map(|u| u.start).unwrap_or(source_len);
        let body = units[body_start.min(end_idx)..end_idx]
            .iter()
            .map(|u| u.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let content = truncate_chars(&normalize_whitespace(&body), self.max_section_chars);

        Candidate {
            tier,
            start: units[heading_idx].start,
            end,
            content,
        }
    }

    fn is_boundary(&self, pattern: &SectionPattern, unit: &Unit, distance: usize) -> bool {
        if !self.is_heading_sized(&unit.text) || !self.boundary.is_match(&unit.text) {
            return false;
        }
        // The heading's own wording may echo right below it.
        !(distance < HEADING_ECHO_UNITS && pattern.tier_of(&unit.text).is_some())
    }

    fn is_heading_sized(&self, text: &str) -> bool {
        text.chars().count() <= self.heading_max_chars
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

//! Heading-based segmentation of free-text summaries.
//!
//! A summary is a block of text where each canonical heading sits on its own
//! line, followed by bullet lines. The segmenter slices the text at every
//! heading line and turns the lines in between into bullet strings.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::{HeadingMatch, Sections, CANONICAL_HEADINGS};
use crate::{Error, Result};

/// Top-level label some summaries start with; it is not a section.
static SUMMARY_LABEL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*Detailed Summary with Key Points\s*[\n:]*").unwrap()
});

/// Leading bullet marker: one of `-`, `•`, `*` (whitespace optional), or any
/// other single non-alphanumeric character followed by whitespace.
static BULLET_MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-•*]\s*|[^\p{L}\p{N}\s]\s+)").unwrap());

/// Characters that end a line once `\r\n` and `\r` are normalized to `\n`.
const LINE_BOUNDARIES: &[char] = &[
    '\n', '\u{b}', '\u{c}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{85}', '\u{2028}', '\u{2029}',
];

/// Lines at least this long are never treated as headings by the fallback scan.
const FALLBACK_MAX_HEADING_CHARS: usize = 100;

/// Splits a summary into bullet lists keyed by heading.
#[derive(Debug, Clone)]
pub struct SummarySegmenter {
    headings: Vec<String>,
    heading_regex: Regex,
}

impl SummarySegmenter {
    /// Create a segmenter for the given headings.
    pub fn new<S: AsRef<str>>(headings: &[S]) -> Result<Self> {
        let headings: Vec<String> = headings
            .iter()
            .map(|h| h.as_ref().trim().to_string())
            .collect();

        if headings.is_empty() || headings.iter().any(|h| h.is_empty()) {
            return Err(Error::InvalidHeadings(
                "heading list must contain only non-empty headings".to_string(),
            ));
        }

        // Longest first so a heading that prefixes another cannot shadow it.
        let mut escaped: Vec<String> = headings.iter().map(|h| regex::escape(h)).collect();
        escaped.sort_by(|a, b| b.len().cmp(&a.len()));

        let pattern = format!(r"(?i)^\s*({})\s*$", escaped.join("|"));
        let heading_regex =
            Regex::new(&pattern).map_err(|e| Error::InvalidHeadings(e.to_string()))?;

        Ok(Self {
            headings,
            heading_regex,
        })
    }

    /// Create a segmenter for the five canonical headings.
    pub fn canonical() -> Result<Self> {
        Self::new(&CANONICAL_HEADINGS)
    }

    /// The headings this segmenter recognises, in order.
    pub fn headings(&self) -> &[String] {
        &self.headings
    }

    /// Split a summary into sections.
    ///
    /// Never fails: text without recognisable headings yields a mapping where
    /// every heading has an empty bullet list.
    pub fn segment(&self, summary: &str) -> Sections {
        let mut sections = Sections::new(&self.headings);

        if summary.trim().is_empty() {
            log::warn!("Summary is empty");
            return sections;
        }

        let text = summary.replace("\r\n", "\n").replace('\r', "\n");
        log::debug!("Summary length: {}", text.len());

        let text = SUMMARY_LABEL_REGEX.replace_all(&text, "");
        let lines = split_lines(&text);

        let mut matches = self.find_headings(&lines);
        if matches.is_empty() {
            log::warn!("No headings found in summary, trying fallback scan");
            matches = self.find_headings_fallback(&lines);
        }
        if matches.is_empty() {
            log::error!("No headings found in summary after fallback scan");
            return sections;
        }

        for (i, found) in matches.iter().enumerate() {
            let Some(canonical) = self.resolve(&found.text) else {
                log::warn!("Could not match heading '{}'", found.text);
                continue;
            };

            let start = found.line + 1;
            let end = matches.get(i + 1).map_or(lines.len(), |next| next.line);
            log::debug!(
                "Extracting content for '{}' from line {} to {}",
                canonical,
                start,
                end
            );

            let bullets = lines[start..end]
                .iter()
                .filter_map(|line| parse_bullet(line))
                .collect::<Vec<_>>();

            log::debug!("Found {} bullets for '{}'", bullets.len(), canonical);
            sections.set(canonical, bullets);
        }

        sections
    }

    /// Lines that consist of exactly one heading.
    fn find_headings(&self, lines: &[&str]) -> Vec<HeadingMatch> {
        let mut matches = Vec::new();
        for (idx, line) in lines.iter().enumerate() {
            if let Some(caps) = self.heading_regex.captures(line.trim()) {
                let text = caps[1].trim();
                log::debug!("Found heading '{}' at line {}", text, idx);
                matches.push(HeadingMatch::new(idx, text));
            }
        }
        matches
    }

    /// Short lines that merely contain a heading.
    fn find_headings_fallback(&self, lines: &[&str]) -> Vec<HeadingMatch> {
        let mut matches = Vec::new();
        for (idx, line) in lines.iter().enumerate() {
            let clean = line.trim();
            if clean.chars().count() >= FALLBACK_MAX_HEADING_CHARS {
                continue;
            }
            let lower = clean.to_lowercase();
            if let Some(heading) = self
                .headings
                .iter()
                .find(|h| lower.contains(&h.to_lowercase()))
            {
                log::debug!("Fallback found heading '{}' at line {}", heading, idx);
                matches.push(HeadingMatch::new(idx, heading.clone()));
            }
        }
        matches
    }

    /// Map matched heading text to the first canonical heading it equals or contains.
    fn resolve(&self, matched: &str) -> Option<&str> {
        let lower = matched.to_lowercase();
        self.headings
            .iter()
            .find(|h| {
                let h = h.to_lowercase();
                lower == h || lower.contains(&h)
            })
            .map(String::as_str)
    }
}

/// Split on every line boundary. A trailing boundary does not start an
/// extra empty line.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.split(LINE_BOUNDARIES).collect();
    if text.is_empty() || text.ends_with(LINE_BOUNDARIES) {
        lines.pop();
    }
    lines
}

/// Turn one content line into a bullet, or `None` for blank and marker-only lines.
fn parse_bullet(line: &str) -> Option<String> {
    if line.trim().is_empty() {
        return None;
    }
    let cleaned = BULLET_MARKER_REGEX.replace(line, "");
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

//! Domain types shared by the deck generator and the PDF extractor.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// The five section labels a summary is expected to contain, in slide order.
pub const CANONICAL_HEADINGS: [&str; 5] = [
    "Background & Motivation",
    "Key Findings",
    "Methods & Evidence",
    "Therapeutic Implications",
    "Conclusion",
];

/// A canonical heading and the bullets found beneath it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarySection {
    /// Canonical heading text.
    pub heading: String,

    /// Bullet strings in input order.
    pub bullets: Vec<String>,
}

impl SummarySection {
    /// Create an empty section for the given heading.
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            bullets: Vec::new(),
        }
    }
}

/// Bullets keyed by canonical heading.
///
/// Every heading passed to [`Sections::new`] is always present; headings with
/// no content map to an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sections {
    sections: Vec<SummarySection>,
}

impl Sections {
    /// Create a mapping with an empty bullet list for every heading.
    pub fn new<S: AsRef<str>>(headings: &[S]) -> Self {
        Self {
            sections: headings
                .iter()
                .map(|h| SummarySection::new(h.as_ref()))
                .collect(),
        }
    }

    /// Bullets for a heading, or `None` if the heading is not one of the keys.
    pub fn get(&self, heading: &str) -> Option<&[String]> {
        self.sections
            .iter()
            .find(|s| s.heading == heading)
            .map(|s| s.bullets.as_slice())
    }

    /// Replace the bullets of an existing heading. Unknown headings are ignored.
    pub fn set(&mut self, heading: &str, bullets: Vec<String>) -> bool {
        match self.sections.iter_mut().find(|s| s.heading == heading) {
            Some(section) => {
                section.bullets = bullets;
                true
            }
            None => false,
        }
    }

    /// Headings in their canonical order.
    pub fn headings(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.heading.as_str())
    }

    /// Iterate over the sections in canonical order.
    pub fn iter(&self) -> std::slice::Iter<'_, SummarySection> {
        self.sections.iter()
    }

    /// Number of headings (always the number the mapping was created with).
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether the mapping has no headings at all.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Whether every section has no bullets.
    pub fn all_empty(&self) -> bool {
        self.sections.iter().all(|s| s.bullets.is_empty())
    }
}

impl<'a> IntoIterator for &'a Sections {
    type Item = &'a SummarySection;
    type IntoIter = std::slice::Iter<'a, SummarySection>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A summary line recognised as a heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingMatch {
    /// 0-based line index within the normalized summary.
    pub line: usize,

    /// The heading text as it was matched (canonical text for fuzzy matches).
    pub text: String,
}

impl HeadingMatch {
    /// A heading found on `line` (0-based).
    pub fn new(line: usize, text: impl Into<String>) -> Self {
        Self {
            line,
            text: text.into(),
        }
    }
}

/// Input payload for the deck generator.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePayload {
    /// Existing presentation template.
    #[serde(default)]
    pub template_path: Option<PathBuf>,

    /// Destination for the populated deck.
    #[serde(default)]
    pub output_path: Option<PathBuf>,

    /// Free-text summary with section headings.
    #[serde(default)]
    pub summary: String,
}

impl GeneratePayload {
    /// Read and decode a payload file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Decode a payload from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::PayloadError(e.to_string()))
    }
}

/// Outcome of a PDF extraction run, printed as JSON for the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub success: bool,
    pub pdf_path: String,
    pub output_dir: String,
    pub images: Vec<String>,
    pub tables: Vec<String>,
    pub total_images: usize,
    pub total_tables: usize,
    pub extractor_version: String,
    pub extraction_timestamp: String,
}

impl ExtractionResult {
    /// Build a successful result stamped with the current UTC time.
    pub fn new(
        pdf_path: impl Into<String>,
        output_dir: impl Into<String>,
        images: Vec<String>,
        tables: Vec<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            pdf_path: pdf_path.into(),
            output_dir: output_dir.into(),
            total_images: images.len(),
            total_tables: tables.len(),
            images,
            tables,
            extractor_version: version.into(),
            extraction_timestamp: Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        }
    }

    /// Pretty-printed JSON form.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::PayloadError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_have_every_key() {
        let sections = Sections::new(&CANONICAL_HEADINGS);
        assert_eq!(sections.len(), 5);
        for heading in CANONICAL_HEADINGS {
            assert_eq!(sections.get(heading), Some(&[][..]));
        }
        assert!(sections.all_empty());
        assert_eq!(sections.get("Abstract"), None);
    }

    #[test]
    fn test_sections_set_ignores_unknown_heading() {
        let mut sections = Sections::new(&CANONICAL_HEADINGS);
        assert!(sections.set("Conclusion", vec!["done".to_string()]));
        assert!(!sections.set("Appendix", vec!["x".to_string()]));
        assert_eq!(sections.get("Conclusion").unwrap(), ["done"]);
        assert_eq!(sections.len(), 5);
    }

    #[test]
    fn test_payload_camel_case() {
        let payload = GeneratePayload::from_json(
            r#"{"templatePath": "t.pptx", "outputPath": "o.pptx", "summary": "Key Findings\n- c"}"#,
        )
        .unwrap();
        assert_eq!(payload.template_path, Some(PathBuf::from("t.pptx")));
        assert_eq!(payload.output_path, Some(PathBuf::from("o.pptx")));
        assert!(payload.summary.starts_with("Key Findings"));
    }

    #[test]
    fn test_payload_missing_summary_defaults_empty() {
        let payload = GeneratePayload::from_json(r#"{"templatePath": "t.pptx"}"#).unwrap();
        assert_eq!(payload.summary, "");
        assert_eq!(payload.output_path, None);
    }

    #[test]
    fn test_payload_malformed() {
        assert!(matches!(
            GeneratePayload::from_json("{not json"),
            Err(Error::PayloadError(_))
        ));
    }

    #[test]
    fn test_extraction_result_json_fields() {
        let result = ExtractionResult::new(
            "paper.pdf",
            "/tmp/images",
            vec!["paper-page1-img1.jpeg".to_string()],
            vec![],
            "1.3.0",
        );
        assert_eq!(result.total_images, 1);
        assert_eq!(result.total_tables, 0);
        assert!(result.extraction_timestamp.ends_with(" UTC"));

        let value: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["pdf_path"], "paper.pdf");
        assert_eq!(value["images"][0], "paper-page1-img1.jpeg");
        assert_eq!(value["total_tables"], 0);
        assert_eq!(value["extractor_version"], "1.3.0");
    }
}

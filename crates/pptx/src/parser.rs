//! PPTX file parser implementation.

use locker_core::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Read, Seek};

use crate::package::Package;
use crate::presentation::Presentation;
use crate::slide::Slide;
use crate::xml::local_name;

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PART: &str = "ppt/_rels/presentation.xml.rels";

/// Parser for PPTX (Office Open XML) files.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a PPTX file from a reader.
    pub fn parse<R: Read + Seek>(&self, reader: R) -> Result<Presentation> {
        let package = Package::from_reader(reader)?;
        self.parse_package(package)
    }

    /// Parse the slides of an already loaded package.
    pub fn parse_package(&self, package: Package) -> Result<Presentation> {
        let slide_order = self.get_slide_order(&package)?;

        let mut slides = Vec::with_capacity(slide_order.len());
        for (idx, slide_path) in slide_order.iter().enumerate() {
            let xml = package.part_str(slide_path)?;
            slides.push(Slide::parse(idx + 1, slide_path.as_str(), xml)?);
        }

        log::debug!("Parsed {} slides", slides.len());
        Ok(Presentation::new(package, slides))
    }

    /// Get the ordered list of slide part names.
    ///
    /// Order comes from `p:sldIdLst` in presentation.xml; when that list is
    /// missing, slides are ordered by the number in their relationship id or
    /// file name.
    fn get_slide_order(&self, package: &Package) -> Result<Vec<String>> {
        let rels_content = package.part_str(PRESENTATION_RELS_PART)?;
        let relationships = parse_slide_relationships(&rels_content)?;

        let listed = match package.part_str(PRESENTATION_PART) {
            Ok(content) => parse_slide_id_list(&content)?,
            Err(e) => {
                log::warn!("Could not read {}: {}", PRESENTATION_PART, e);
                Vec::new()
            }
        };

        if !listed.is_empty() {
            let targets: HashMap<&str, &str> = relationships
                .iter()
                .map(|r| (r.id.as_str(), r.target.as_str()))
                .collect();
            let mut ordered = Vec::with_capacity(listed.len());
            for rel_id in &listed {
                match targets.get(rel_id.as_str()) {
                    Some(target) => ordered.push(target.to_string()),
                    None => log::warn!("Slide relationship '{}' has no target", rel_id),
                }
            }
            return Ok(ordered);
        }

        let mut slides: Vec<(String, Option<usize>)> = relationships
            .into_iter()
            .map(|r| {
                let order_num = extract_slide_number(&r.id).or_else(|| extract_slide_number(&r.target));
                (r.target, order_num)
            })
            .collect();

        // Sort slides by their number
        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// A slide relationship from presentation.xml.rels.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SlideRelationship {
    id: String,
    /// Part name inside the package.
    target: String,
}

/// Slide relationships, excluding layouts and masters.
fn parse_slide_relationships(content: &str) -> Result<Vec<SlideRelationship>> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);
    let mut slides = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut rel_type = String::new();
                let mut target = String::new();
                let mut id = String::new();

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Type" => rel_type = String::from_utf8_lossy(&attr.value).to_string(),
                        b"Target" => target = String::from_utf8_lossy(&attr.value).to_string(),
                        b"Id" => id = String::from_utf8_lossy(&attr.value).to_string(),
                        _ => {}
                    }
                }

                if rel_type.ends_with("/slide") {
                    slides.push(SlideRelationship {
                        id,
                        target: resolve_target(&target),
                    });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing relationships: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(slides)
}

/// Relationship ids of `p:sldIdLst/p:sldId`, in presentation order.
fn parse_slide_id_list(content: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                for attr in e.attributes().flatten() {
                    if local_name(attr.key.as_ref()) == b"id" && attr.key.as_ref() != b"id" {
                        ids.push(String::from_utf8_lossy(&attr.value).to_string());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing presentation: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// Turn a relationship target relative to `ppt/` into a part name.
fn resolve_target(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        absolute.to_string()
    } else {
        format!("ppt/{}", target)
    }
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    // Remove common extensions first
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    // Try to find digits at the end
    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

//! Text frames: reading a shape's `txBody` and rewriting it as bullets.

use locker_core::{Error, Result};
use quick_xml::escape::escape;

use crate::xml::{Element, OwnedElement};

/// Default bullet font size, in hundredths of a point.
pub const DEFAULT_FONT_SIZE: u32 = 1400;

/// Largest `sz` DrawingML allows (4000pt).
pub const MAX_FONT_SIZE: u32 = 400_000;

/// A paragraph of a text frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    properties: Option<OwnedElement>,
    end_properties: Option<OwnedElement>,
    /// Plain text of the paragraph.
    pub text: String,
}

impl Paragraph {
    fn new(prefix: &str, text: impl Into<String>) -> Self {
        Self {
            properties: Some(OwnedElement::new(format!("{}:pPr", prefix))),
            end_properties: None,
            text: text.into(),
        }
    }

    /// Indentation level, 0 when unset.
    pub fn level(&self) -> u32 {
        self.properties
            .as_ref()
            .and_then(|p| p.attrs.iter().find(|(k, _)| k == "lvl"))
            .and_then(|(_, v)| v.parse().ok())
            .unwrap_or(0)
    }

    /// Default run font size in hundredths of a point, if set.
    pub fn font_size(&self) -> Option<u32> {
        let props = self.properties.as_ref()?;
        let children = props.children().ok()?;
        let def_rpr = children.iter().find(|c| c.local() == "defRPr")?;
        def_rpr
            .attrs
            .iter()
            .find(|(k, _)| k == "sz")
            .and_then(|(_, v)| v.parse().ok())
    }

    fn set_level(&mut self, prefix: &str, level: u32) {
        let props = self
            .properties
            .get_or_insert_with(|| OwnedElement::new(format!("{}:pPr", prefix)));
        if level == 0 {
            props.remove_attr("lvl");
        } else {
            props.set_attr("lvl", level.to_string());
        }
    }

    /// Set `pPr/defRPr/@sz`, keeping the other paragraph properties.
    fn set_font_size(&mut self, prefix: &str, size: u32) -> Result<()> {
        let props = self
            .properties
            .get_or_insert_with(|| OwnedElement::new(format!("{}:pPr", prefix)));
        let mut children = props.children()?;

        match children.iter_mut().find(|c| c.local() == "defRPr") {
            Some(def_rpr) => def_rpr.set_attr("sz", size.to_string()),
            None => {
                let mut def_rpr = OwnedElement::new(format!("{}:defRPr", prefix));
                def_rpr.set_attr("sz", size.to_string());
                // defRPr precedes extLst in CT_TextParagraphProperties.
                let at = children
                    .iter()
                    .position(|c| c.local() == "extLst")
                    .unwrap_or(children.len());
                children.insert(at, def_rpr);
            }
        }

        props.set_children(&children);
        Ok(())
    }

    fn to_xml(&self, prefix: &str) -> String {
        let mut out = format!("<{}:p>", prefix);
        if let Some(props) = &self.properties {
            out.push_str(&props.to_xml());
        }
        if !self.text.is_empty() {
            out.push_str(&format!(
                "<{p}:r><{p}:t>{text}</{p}:t></{p}:r>",
                p = prefix,
                text = escape(self.text.as_str())
            ));
        }
        if let Some(end) = &self.end_properties {
            out.push_str(&end.to_xml());
        }
        out.push_str(&format!("</{}:p>", prefix));
        out
    }
}

/// A shape's text frame (`p:txBody`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBody {
    qname: String,
    attrs: Vec<(String, String)>,
    /// DrawingML namespace prefix used for paragraphs and runs.
    prefix: String,
    body_properties: OwnedElement,
    list_style: Option<OwnedElement>,
    paragraphs: Vec<Paragraph>,
}

impl TextBody {
    /// An empty text frame, for shapes that have none.
    pub fn empty(shape_prefix: &str) -> Self {
        Self {
            qname: format!("{}:txBody", shape_prefix),
            attrs: Vec::new(),
            prefix: "a".to_string(),
            body_properties: OwnedElement::new("a:bodyPr"),
            list_style: Some(OwnedElement::new("a:lstStyle")),
            paragraphs: vec![Paragraph {
                properties: None,
                end_properties: None,
                text: String::new(),
            }],
        }
    }

    /// Parse a `txBody` element of `xml`.
    pub(crate) fn parse(xml: &str, element: &Element) -> Result<Self> {
        let mut prefix = None;
        let mut body_properties = None;
        let mut list_style = None;
        let mut paragraphs = Vec::new();

        for child in element.children(xml)? {
            if prefix.is_none() {
                prefix = child.prefix().map(str::to_string);
            }
            match child.local() {
                "bodyPr" => body_properties = Some(OwnedElement::from_element(xml, &child)),
                "lstStyle" => list_style = Some(OwnedElement::from_element(xml, &child)),
                "p" => {
                    let mut properties = None;
                    let mut end_properties = None;
                    for part in child.children(xml)? {
                        match part.local() {
                            "pPr" => properties = Some(OwnedElement::from_element(xml, &part)),
                            "endParaRPr" => {
                                end_properties = Some(OwnedElement::from_element(xml, &part))
                            }
                            _ => {}
                        }
                    }
                    paragraphs.push(Paragraph {
                        properties,
                        end_properties,
                        text: child.paragraph_text(xml)?,
                    });
                }
                _ => {}
            }
        }

        let prefix = prefix.unwrap_or_else(|| "a".to_string());
        let body_properties = body_properties
            .ok_or_else(|| Error::PptxError("Text body has no <bodyPr>".to_string()))?;

        if paragraphs.is_empty() {
            paragraphs.push(Paragraph {
                properties: None,
                end_properties: None,
                text: String::new(),
            });
        }

        Ok(Self {
            qname: element.qname.clone(),
            attrs: element.attrs.clone(),
            prefix,
            body_properties,
            list_style,
            paragraphs,
        })
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    /// Text of each paragraph.
    pub fn texts(&self) -> Vec<&str> {
        self.paragraphs.iter().map(|p| p.text.as_str()).collect()
    }

    /// Drop every paragraph after the first and empty the first one.
    pub fn clear(&mut self) {
        self.paragraphs.truncate(1);
        match self.paragraphs.first_mut() {
            Some(first) => first.text.clear(),
            None => self.paragraphs.push(Paragraph {
                properties: None,
                end_properties: None,
                text: String::new(),
            }),
        }
    }

    /// Replace the content with one level-0 paragraph per bullet.
    ///
    /// The first bullet reuses the first paragraph and its properties. An
    /// empty list leaves a single empty paragraph.
    pub fn set_bullets(&mut self, bullets: &[String], font_size: u32) {
        self.clear();

        let Some((first, rest)) = bullets.split_first() else {
            return;
        };

        let prefix = self.prefix.clone();
        let style = |paragraph: &mut Paragraph| {
            paragraph.set_level(&prefix, 0);
            if let Err(e) = paragraph.set_font_size(&prefix, font_size) {
                log::warn!("Could not set font size: {}", e);
            }
        };

        if let Some(paragraph) = self.paragraphs.first_mut() {
            paragraph.text = first.clone();
            style(paragraph);
        }

        for (i, bullet) in rest.iter().enumerate() {
            let mut paragraph = Paragraph::new(&prefix, bullet.as_str());
            style(&mut paragraph);
            self.paragraphs.push(paragraph);
            log::debug!("Added bullet {}: {}", i + 1, truncate(bullet, 50));
        }
    }

    pub fn to_xml(&self) -> String {
        let mut root = OwnedElement::new(self.qname.clone());
        root.attrs = self.attrs.clone();

        let mut inner = self.body_properties.to_xml();
        if let Some(list_style) = &self.list_style {
            inner.push_str(&list_style.to_xml());
        }
        for paragraph in &self.paragraphs {
            inner.push_str(&paragraph.to_xml(&self.prefix));
        }
        root.inner = Some(inner);
        root.to_xml()
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

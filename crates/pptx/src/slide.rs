//! Slide parts: shapes, placeholders, and in-place edits.

use locker_core::{Error, Result};
use std::ops::Range;

use crate::text::TextBody;
use crate::xml::{child_elements, Element};

/// EMUs per inch.
pub const EMU_PER_INCH: i64 = 914_400;

/// Kind of a top-level shape on the slide tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// `p:sp`: autoshapes, text boxes, and most placeholders.
    AutoShape,
    /// `p:pic`
    Picture,
    /// `p:graphicFrame`: tables, charts, diagrams.
    GraphicFrame,
    /// `p:grpSp`
    Group,
    /// `p:cxnSp`
    Connector,
    /// Anything else (content parts, alternate content).
    Other,
}

impl ShapeKind {
    fn from_local(local: &str) -> Self {
        match local {
            "sp" => Self::AutoShape,
            "pic" => Self::Picture,
            "graphicFrame" => Self::GraphicFrame,
            "grpSp" => Self::Group,
            "cxnSp" => Self::Connector,
            _ => Self::Other,
        }
    }
}

/// Placeholder information from `p:nvPr/p:ph`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// The `type` attribute; absent means a generic content (`obj`) placeholder.
    pub kind: Option<String>,
    /// The `idx` attribute, 0 when absent.
    pub idx: u32,
}

impl Placeholder {
    /// Whether this is the title placeholder, which always has `idx` 0.
    pub fn is_title(&self) -> bool {
        self.idx == 0
    }
}

/// Position and size of a shape, in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Frame {
    /// Build a frame from inch measurements.
    pub fn from_inches(x: f64, y: f64, cx: f64, cy: f64) -> Self {
        let emu = |v: f64| (v * EMU_PER_INCH as f64).round() as i64;
        Self {
            x: emu(x),
            y: emu(y),
            cx: emu(cx),
            cy: emu(cy),
        }
    }
}

/// A top-level shape of a slide.
#[derive(Debug, Clone)]
pub struct Shape {
    /// `cNvPr/@id`, 0 when absent.
    pub id: u32,
    /// `cNvPr/@name`.
    pub name: String,
    pub kind: ShapeKind,
    pub placeholder: Option<Placeholder>,
    /// Text of each paragraph in the shape's text body.
    pub paragraphs: Vec<String>,
    text_body: Option<Element>,
    /// Offset where a missing text body would be inserted.
    text_body_insert_at: usize,
}

impl Shape {
    /// Whether the shape can hold a text frame.
    pub fn supports_text(&self) -> bool {
        self.kind == ShapeKind::AutoShape
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder.is_some()
    }

    pub fn has_text_body(&self) -> bool {
        self.text_body.is_some()
    }

    /// All paragraph text joined with newlines.
    pub fn text(&self) -> String {
        self.paragraphs.join("\n")
    }
}

/// A parsed slide part.
#[derive(Debug, Clone)]
pub struct Slide {
    /// 1-based position in the presentation.
    pub number: usize,
    /// Package part name, e.g. `ppt/slides/slide1.xml`.
    pub part_name: String,
    xml: String,
    shapes: Vec<Shape>,
    tree: Element,
    modified: bool,
}

impl Slide {
    /// Parse slide XML.
    pub fn parse(number: usize, part_name: impl Into<String>, xml: String) -> Result<Self> {
        let (tree, shapes) = parse_shapes(&xml)?;
        Ok(Self {
            number,
            part_name: part_name.into(),
            xml,
            shapes,
            tree,
            modified: false,
        })
    }

    /// Top-level shapes in document order.
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn xml(&self) -> &str {
        &self.xml
    }

    /// Whether any edit has been applied since parsing.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Index of the title shape: the first placeholder with `idx` 0.
    pub fn title_shape_index(&self) -> Option<usize> {
        self.shapes
            .iter()
            .position(|s| s.placeholder.as_ref().is_some_and(Placeholder::is_title))
    }

    /// Title text with line breaks and whitespace runs collapsed to single
    /// spaces, if the slide has a non-empty title.
    pub fn title(&self) -> Option<String> {
        let index = self.title_shape_index()?;
        let title = self.shapes[index]
            .text()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        (!title.is_empty()).then_some(title)
    }

    /// The text body of a shape, or an empty body if it has none yet.
    pub fn text_body(&self, index: usize) -> Result<TextBody> {
        let shape = self.shape(index)?;
        match &shape.text_body {
            Some(element) => TextBody::parse(&self.xml, element),
            None => Ok(TextBody::empty(self.prefix())),
        }
    }

    /// Replace (or insert) a shape's text body.
    pub fn set_text_body(&mut self, index: usize, body: &TextBody) -> Result<()> {
        let shape = self.shape(index)?;
        if !shape.supports_text() {
            return Err(Error::PptxError(format!(
                "Shape '{}' on slide {} cannot hold text",
                shape.name, self.number
            )));
        }

        let markup = body.to_xml();
        let range = match &shape.text_body {
            Some(element) => element.span.clone(),
            None => shape.text_body_insert_at..shape.text_body_insert_at,
        };
        self.splice(range, &markup)
    }

    /// Append a text box and return its shape index.
    pub fn add_text_box(&mut self, frame: Frame) -> Result<usize> {
        let id = self.next_shape_id()?;
        let p = self.prefix();
        let markup = format!(
            concat!(
                "<{p}:sp><{p}:nvSpPr><{p}:cNvPr id=\"{id}\" name=\"TextBox {n}\"/>",
                "<{p}:cNvSpPr txBox=\"1\"/><{p}:nvPr/></{p}:nvSpPr>",
                "<{p}:spPr><a:xfrm><a:off x=\"{x}\" y=\"{y}\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>",
                "<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom><a:noFill/></{p}:spPr>",
                "<{p}:txBody><a:bodyPr wrap=\"none\"><a:spAutoFit/></a:bodyPr><a:lstStyle/><a:p/></{p}:txBody>",
                "</{p}:sp>"
            ),
            p = p,
            id = id,
            n = id.saturating_sub(1),
            x = frame.x,
            y = frame.y,
            cx = frame.cx,
            cy = frame.cy,
        );

        let at = self.tree.close_tag_start();
        self.splice(at..at, &markup)?;
        Ok(self.shapes.len() - 1)
    }

    fn shape(&self, index: usize) -> Result<&Shape> {
        self.shapes.get(index).ok_or_else(|| {
            Error::PptxError(format!("Slide {} has no shape {}", self.number, index))
        })
    }

    /// Namespace prefix used for the presentationml elements of this slide.
    fn prefix(&self) -> &str {
        self.tree.prefix().unwrap_or("p")
    }

    fn next_shape_id(&self) -> Result<u32> {
        Ok(max_shape_id(&self.xml, &self.tree)? + 1)
    }

    /// Replace a byte range with new markup and re-index the shapes.
    fn splice(&mut self, range: Range<usize>, markup: &str) -> Result<()> {
        let mut xml = String::with_capacity(self.xml.len() + markup.len());
        xml.push_str(&self.xml[..range.start]);
        xml.push_str(markup);
        xml.push_str(&self.xml[range.end..]);

        let (tree, shapes) = parse_shapes(&xml)?;
        self.xml = xml;
        self.tree = tree;
        self.shapes = shapes;
        self.modified = true;
        Ok(())
    }
}

/// Locate `p:sld/p:cSld/p:spTree` and parse its direct children.
fn parse_shapes(xml: &str) -> Result<(Element, Vec<Shape>)> {
    let root = child_elements(xml, 0..xml.len())?
        .into_iter()
        .find(|e| e.local() == "sld")
        .ok_or_else(|| Error::PptxError("Slide part has no <sld> root".to_string()))?;
    let c_sld = root
        .child(xml, "cSld")?
        .ok_or_else(|| Error::PptxError("Slide has no <cSld>".to_string()))?;
    let tree = c_sld
        .child(xml, "spTree")?
        .ok_or_else(|| Error::PptxError("Slide has no <spTree>".to_string()))?;

    let mut shapes = Vec::new();
    for element in tree.children(xml)? {
        let kind = ShapeKind::from_local(element.local());
        if matches!(element.local(), "nvGrpSpPr" | "grpSpPr" | "extLst") {
            continue;
        }
        shapes.push(parse_shape(xml, element, kind)?);
    }

    Ok((tree, shapes))
}

fn parse_shape(xml: &str, element: Element, kind: ShapeKind) -> Result<Shape> {
    let mut id = 0;
    let mut name = String::new();
    let mut placeholder = None;
    let mut text_body = None;
    let mut ext_lst_start = None;

    for child in element.children(xml)? {
        match child.local() {
            local if local.starts_with("nv") && local.ends_with("Pr") => {
                for prop in child.children(xml)? {
                    match prop.local() {
                        "cNvPr" => {
                            id = prop.attr("id").and_then(|v| v.parse().ok()).unwrap_or(0);
                            name = prop.attr("name").unwrap_or_default().to_string();
                        }
                        "nvPr" => {
                            if let Some(ph) = prop.child(xml, "ph")? {
                                placeholder = Some(Placeholder {
                                    kind: ph.attr("type").map(str::to_string),
                                    idx: ph.attr("idx").and_then(|v| v.parse().ok()).unwrap_or(0),
                                });
                            }
                        }
                        _ => {}
                    }
                }
            }
            "txBody" => text_body = Some(child),
            "extLst" => ext_lst_start = Some(child.span.start),
            _ => {}
        }
    }

    let paragraphs = match &text_body {
        Some(body) => body
            .children(xml)?
            .iter()
            .filter(|p| p.local() == "p")
            .map(|p| p.paragraph_text(xml))
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    let text_body_insert_at = ext_lst_start.unwrap_or_else(|| element.close_tag_start());

    Ok(Shape {
        id,
        name,
        kind,
        placeholder,
        paragraphs,
        text_body,
        text_body_insert_at,
    })
}

/// Largest `cNvPr/@id` anywhere under the element.
fn max_shape_id(xml: &str, element: &Element) -> Result<u32> {
    let mut max = 0;
    for child in element.children(xml)? {
        if child.local() == "cNvPr" {
            let id = child.attr("id").and_then(|v| v.parse().ok()).unwrap_or(0);
            max = max.max(id);
        } else {
            max = max.max(max_shape_id(xml, &child)?);
        }
    }
    Ok(max)
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Slide XML with a title placeholder and a list of extra shapes.
    pub fn slide_xml(title: Option<&str>, extra_shapes: &str) -> String {
        let title_shape = title
            .map(|t| {
                format!(
                    concat!(
                        r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/>"#,
                        r#"<p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/>"#,
                        r#"<p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#
                    ),
                    t
                )
            })
            .unwrap_or_default();

        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                "\n",
                r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
                r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
                r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">"#,
                r#"<p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
                r#"<p:grpSpPr/>{}{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#
            ),
            title_shape, extra_shapes
        )
    }

    /// A body placeholder with existing paragraphs.
    pub fn body_placeholder(id: u32, paragraphs: &[&str]) -> String {
        let paras: String = paragraphs
            .iter()
            .map(|p| format!(r#"<a:p><a:pPr lvl="1"/><a:r><a:t>{}</a:t></a:r></a:p>"#, p))
            .collect();
        format!(
            concat!(
                r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Content Placeholder {id}"/><p:cNvSpPr/>"#,
                r#"<p:nvPr><p:ph idx="1"/></p:nvPr></p:nvSpPr><p:spPr/>"#,
                r#"<p:txBody><a:bodyPr anchor="t"/><a:lstStyle/>{paras}</p:txBody></p:sp>"#
            ),
            id = id,
            paras = paras
        )
    }

    /// A placeholder of the given type and index holding one paragraph.
    pub fn typed_placeholder(id: u32, kind: &str, idx: u32, text: &str) -> String {
        format!(
            concat!(
                r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Placeholder {id}"/><p:cNvSpPr/>"#,
                r#"<p:nvPr><p:ph type="{kind}" idx="{idx}"/></p:nvPr></p:nvSpPr><p:spPr/>"#,
                r#"<p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"#
            ),
            id = id,
            kind = kind,
            idx = idx,
            text = text
        )
    }

    /// A plain (non-placeholder) text shape.
    pub fn text_shape(id: u32, text: &str) -> String {
        format!(
            concat!(
                r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="TextBox {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#,
                r#"<p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"#
            ),
            id = id,
            text = text
        )
    }

    /// A picture shape.
    pub fn picture(id: u32) -> String {
        format!(
            concat!(
                r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="Picture {id}"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr>"#,
                r#"<p:blipFill/><p:spPr/></p:pic>"#
            ),
            id = id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_parse_title_and_shapes() {
        let xml = slide_xml(
            Some("Key Findings"),
            &format!("{}{}", picture(3), body_placeholder(4, &["old"])),
        );
        let slide = Slide::parse(1, "ppt/slides/slide1.xml", xml).unwrap();

        assert_eq!(slide.shapes().len(), 3);
        assert_eq!(slide.title(), Some("Key Findings".to_string()));
        assert_eq!(slide.title_shape_index(), Some(0));
        assert_eq!(slide.shapes()[1].kind, ShapeKind::Picture);
        assert!(!slide.shapes()[1].supports_text());

        let body = &slide.shapes()[2];
        assert_eq!(body.id, 4);
        assert_eq!(body.placeholder, Some(Placeholder { kind: None, idx: 1 }));
        assert_eq!(body.paragraphs, vec!["old"]);
    }

    #[test]
    fn test_title_is_idx_zero_placeholder() {
        let shapes = format!(
            "{}{}",
            typed_placeholder(3, "ftr", 11, "Footer"),
            typed_placeholder(4, "ctrTitle", 0, "Conclusion"),
        );
        let slide = Slide::parse(1, "s.xml", slide_xml(None, &shapes)).unwrap();
        assert_eq!(slide.title_shape_index(), Some(1));
        assert_eq!(slide.title(), Some("Conclusion".to_string()));
    }

    #[test]
    fn test_title_line_break_reads_as_space() {
        let title = concat!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/>"#,
            r#"<p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/>"#,
            r#"<a:p><a:r><a:t>Key</a:t></a:r><a:br/><a:r><a:t>Findings</a:t></a:r></a:p></p:txBody></p:sp>"#
        );
        let slide = Slide::parse(1, "s.xml", slide_xml(None, title)).unwrap();
        assert_eq!(slide.shapes()[0].paragraphs, vec!["Key\u{b}Findings"]);
        assert_eq!(slide.title(), Some("Key Findings".to_string()));
    }

    #[test]
    fn test_blank_title_is_none() {
        let slide = Slide::parse(1, "s.xml", slide_xml(Some("   "), "")).unwrap();
        assert_eq!(slide.title(), None);
        let slide = Slide::parse(1, "s.xml", slide_xml(None, "")).unwrap();
        assert_eq!(slide.title(), None);
    }

    #[test]
    fn test_add_text_box_uses_next_id() {
        let mut slide =
            Slide::parse(1, "s.xml", slide_xml(Some("Conclusion"), &body_placeholder(7, &[]))).unwrap();
        let index = slide
            .add_text_box(Frame::from_inches(0.5, 1.5, 9.0, 5.0))
            .unwrap();

        assert_eq!(index, 2);
        let shape = &slide.shapes()[index];
        assert_eq!(shape.id, 8);
        assert_eq!(shape.name, "TextBox 7");
        assert!(shape.supports_text());
        assert!(!shape.is_placeholder());
        assert!(slide.is_modified());
        assert!(slide.xml().contains(r#"<a:off x="457200" y="1371600"/>"#));
        assert!(slide.xml().contains(r#"<a:ext cx="8229600" cy="4572000"/>"#));
    }

    #[test]
    fn test_set_text_body_inserts_missing_body() {
        let shape = r#"<p:sp><p:nvSpPr><p:cNvPr id="5" name="Rect"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/></p:sp>"#;
        let mut slide = Slide::parse(1, "s.xml", slide_xml(None, shape)).unwrap();
        assert!(!slide.shapes()[0].has_text_body());

        let mut body = slide.text_body(0).unwrap();
        body.set_bullets(&["one".to_string()], 1400);
        slide.set_text_body(0, &body).unwrap();

        assert!(slide.shapes()[0].has_text_body());
        assert_eq!(slide.shapes()[0].paragraphs, vec!["one"]);
        assert!(slide.xml().contains("<p:spPr/><p:txBody>"));
    }

    #[test]
    fn test_set_text_body_rejects_picture() {
        let mut slide = Slide::parse(1, "s.xml", slide_xml(None, &picture(3))).unwrap();
        let body = TextBody::empty("p");
        assert!(slide.set_text_body(0, &body).is_err());
        assert!(!slide.is_modified());
    }

    #[test]
    fn test_missing_sp_tree() {
        let xml = r#"<p:sld xmlns:p="p"><p:cSld/></p:sld>"#.to_string();
        assert!(Slide::parse(1, "s.xml", xml).is_err());
    }
}

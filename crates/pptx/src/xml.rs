//! Minimal span-tracking XML helpers for editing OOXML parts in place.
//!
//! Slide parts are kept as text; edits splice new markup into byte ranges
//! found by these helpers, so everything the filler does not touch is
//! written back byte-for-byte.

use locker_core::{Error, Result};
use quick_xml::escape::{escape, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::ops::Range;

/// How a soft line break (`a:br`) reads in paragraph text.
pub(crate) const LINE_BREAK: char = '\u{b}';

/// An element located inside a larger XML string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Element {
    /// Qualified name, e.g. `p:sp`.
    pub qname: String,
    /// Unescaped attributes in document order.
    pub attrs: Vec<(String, String)>,
    /// Byte range of the whole element, tags included.
    pub span: Range<usize>,
    /// Byte range of the content between the tags; `None` for `<x/>`.
    pub inner: Option<Range<usize>>,
}

impl Element {
    pub fn local(&self) -> &str {
        local_name_str(&self.qname)
    }

    pub fn prefix(&self) -> Option<&str> {
        self.qname.split_once(':').map(|(p, _)| p)
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Child elements of this element.
    pub fn children(&self, xml: &str) -> Result<Vec<Element>> {
        match &self.inner {
            Some(range) => child_elements(xml, range.clone()),
            None => Ok(Vec::new()),
        }
    }

    /// First child with the given local name.
    pub fn child(&self, xml: &str, local: &str) -> Result<Option<Element>> {
        Ok(self.children(xml)?.into_iter().find(|c| c.local() == local))
    }

    /// Byte offset of the closing tag, or the element end for `<x/>`.
    pub fn close_tag_start(&self) -> usize {
        match &self.inner {
            Some(range) => range.end,
            None => self.span.end,
        }
    }

    /// Unescaped text of a DrawingML paragraph: every `a:t` run in order, with
    /// each `a:br` line break as [`LINE_BREAK`].
    pub fn paragraph_text(&self, xml: &str) -> Result<String> {
        let mut text = String::new();
        for child in self.children(xml)? {
            match child.local() {
                "t" => {
                    if let Some(inner) = &child.inner {
                        let value = unescape(&xml[inner.clone()])
                            .map_err(|e| Error::XmlError(format!("Bad text content: {}", e)))?;
                        text.push_str(&value);
                    }
                }
                "br" => text.push(LINE_BREAK),
                _ => text.push_str(&child.paragraph_text(xml)?),
            }
        }
        Ok(text)
    }
}

/// Top-level elements within `xml[range]`, with absolute offsets.
pub(crate) fn child_elements(xml: &str, range: Range<usize>) -> Result<Vec<Element>> {
    let base = range.start;
    let fragment = &xml[range];
    let mut reader = Reader::from_str(fragment);
    reader.trim_text(false);

    let mut elements = Vec::new();
    let mut depth = 0usize;
    let mut open: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| Error::XmlError(format!("Error at byte {}: {}", base + reader.buffer_position(), e)))?;
        let after = reader.buffer_position();

        match event {
            Event::Start(ref e) => {
                if depth == 0 {
                    let start = tag_start(fragment, after)?;
                    open = Some(Element {
                        qname: qname(e),
                        attrs: attributes(e)?,
                        span: base + start..base + after,
                        inner: Some(base + after..base + after),
                    });
                }
                depth += 1;
            }
            Event::Empty(ref e) => {
                if depth == 0 {
                    let start = tag_start(fragment, after)?;
                    elements.push(Element {
                        qname: qname(e),
                        attrs: attributes(e)?,
                        span: base + start..base + after,
                        inner: None,
                    });
                }
            }
            Event::End(_) => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    Error::XmlError(format!("Unbalanced closing tag at byte {}", base + after))
                })?;
                if depth == 0 {
                    if let Some(mut element) = open.take() {
                        let close = tag_start(fragment, after)?;
                        let inner_start = element.span.end;
                        element.inner = Some(inner_start..base + close);
                        element.span.end = base + after;
                        elements.push(element);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(Error::XmlError("Unexpected end of XML fragment".to_string()));
    }

    Ok(elements)
}

/// Byte offset of the `<` that opens the tag ending just before `after`.
fn tag_start(fragment: &str, after: usize) -> Result<usize> {
    fragment[..after]
        .rfind('<')
        .ok_or_else(|| Error::XmlError(format!("No tag start before byte {}", after)))
}

fn qname(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

fn attributes(e: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| Error::XmlError(format!("Bad attribute: {}", e)))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::XmlError(format!("Bad attribute value: {}", e)))?
            .to_string();
        attrs.push((key, value));
    }
    Ok(attrs)
}

/// Extract the local name from a potentially namespaced XML element name.
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

fn local_name_str(name: &str) -> &str {
    name.split_once(':').map_or(name, |(_, local)| local)
}

/// An element detached from its document, for rewriting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OwnedElement {
    pub qname: String,
    pub attrs: Vec<(String, String)>,
    pub inner: Option<String>,
}

impl OwnedElement {
    pub fn new(qname: impl Into<String>) -> Self {
        Self {
            qname: qname.into(),
            attrs: Vec::new(),
            inner: None,
        }
    }

    pub fn from_element(xml: &str, element: &Element) -> Self {
        Self {
            qname: element.qname.clone(),
            attrs: element.attrs.clone(),
            inner: element.inner.clone().map(|r| xml[r].to_string()),
        }
    }

    pub fn local(&self) -> &str {
        local_name_str(&self.qname)
    }

    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((key.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, key: &str) {
        self.attrs.retain(|(k, _)| k != key);
    }

    /// Child elements, detached.
    pub fn children(&self) -> Result<Vec<OwnedElement>> {
        let Some(inner) = &self.inner else {
            return Ok(Vec::new());
        };
        Ok(child_elements(inner, 0..inner.len())?
            .iter()
            .map(|c| OwnedElement::from_element(inner, c))
            .collect())
    }

    /// Replace the content with the serialized children.
    pub fn set_children(&mut self, children: &[OwnedElement]) {
        if children.is_empty() {
            self.inner = None;
        } else {
            self.inner = Some(children.iter().map(OwnedElement::to_xml).collect());
        }
    }

    pub fn to_xml(&self) -> String {
        let mut out = format!("<{}", self.qname);
        for (key, value) in &self.attrs {
            out.push_str(&format!(" {}=\"{}\"", key, escape(value.as_str())));
        }
        match &self.inner {
            Some(inner) if !inner.is_empty() => {
                out.push('>');
                out.push_str(inner);
                out.push_str(&format!("</{}>", self.qname));
            }
            _ => out.push_str("/>"),
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0"?><a:root x="1"><a:p><a:r><a:t>Hi &amp; bye</a:t></a:r></a:p><a:br/><a:p>  </a:p></a:root>"#;

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_child_elements_spans() {
        let top = child_elements(SAMPLE, 0..SAMPLE.len()).unwrap();
        assert_eq!(top.len(), 1);
        let root = &top[0];
        assert_eq!(root.qname, "a:root");
        assert_eq!(root.attr("x"), Some("1"));
        assert!(SAMPLE[root.span.clone()].starts_with("<a:root"));
        assert!(SAMPLE[root.span.clone()].ends_with("</a:root>"));

        let children = root.children(SAMPLE).unwrap();
        let names: Vec<&str> = children.iter().map(|c| c.local()).collect();
        assert_eq!(names, vec!["p", "br", "p"]);
        assert_eq!(&SAMPLE[children[1].span.clone()], "<a:br/>");
        assert_eq!(children[1].inner, None);
        assert_eq!(&SAMPLE[children[2].inner.clone().unwrap()], "  ");
    }

    #[test]
    fn test_paragraph_text_unescapes() {
        let root = &child_elements(SAMPLE, 0..SAMPLE.len()).unwrap()[0];
        let first = &root.children(SAMPLE).unwrap()[0];
        assert_eq!(first.paragraph_text(SAMPLE).unwrap(), "Hi & bye");
    }

    #[test]
    fn test_paragraph_text_keeps_line_breaks() {
        let xml = r#"<a:p><a:r><a:t>Key</a:t></a:r><a:br><a:rPr/></a:br><a:r><a:t>Points</a:t></a:r></a:p>"#;
        let p = &child_elements(xml, 0..xml.len()).unwrap()[0];
        assert_eq!(p.paragraph_text(xml).unwrap(), "Key\u{b}Points");
    }

    #[test]
    fn test_owned_element_round_trip() {
        let root = &child_elements(SAMPLE, 0..SAMPLE.len()).unwrap()[0];
        let mut owned = OwnedElement::from_element(SAMPLE, root);
        owned.set_attr("x", "2");
        owned.set_attr("y", "a\"b");
        let xml = owned.to_xml();
        assert!(xml.starts_with(r#"<a:root x="2" y="a&quot;b">"#));
        assert_eq!(owned.children().unwrap().len(), 3);

        owned.set_children(&[]);
        owned.remove_attr("y");
        assert_eq!(owned.to_xml(), r#"<a:root x="2"/>"#);
    }

    #[test]
    fn test_unbalanced_fragment_is_error() {
        let xml = "<a:p><a:r></a:p>";
        assert!(child_elements(xml, 0..xml.len()).is_err());
    }
}

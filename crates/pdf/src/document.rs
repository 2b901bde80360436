//! lopdf helpers for walking pages and image streams.

use locker_core::{Error, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::path::Path;

/// Parent chains deeper than this are treated as broken.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Load a PDF document.
pub fn load(path: &Path) -> Result<Document> {
    Document::load(path)
        .map_err(|e| Error::PdfError(format!("Failed to open {}: {}", path.display(), e)))
}

/// Follow a reference to the object it names.
pub fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Object> {
    match object {
        Object::Reference(id) => doc
            .get_object(*id)
            .map_err(|e| Error::PdfError(format!("Broken reference {:?}: {}", id, e))),
        other => Ok(other),
    }
}

/// Look up a dictionary entry, following references.
pub fn get<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().and_then(|o| resolve(doc, o).ok())
}

pub fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

pub fn name(object: &Object) -> Option<&[u8]> {
    match object {
        Object::Name(n) => Some(n.as_slice()),
        _ => None,
    }
}

/// Look up a page attribute, walking up the page tree for inheritable keys.
pub fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut dict = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Some(value) = get(doc, dict, key) {
            return Some(value);
        }
        dict = match get(doc, dict, b"Parent") {
            Some(Object::Dictionary(parent)) => parent,
            _ => return None,
        };
    }
    None
}

/// The page's resource dictionary, inherited from the page tree if needed.
pub fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    match inherited(doc, page_id, b"Resources") {
        Some(Object::Dictionary(resources)) => Some(resources),
        _ => None,
    }
}

/// Filter names of a stream, in decode order.
pub fn stream_filters<'a>(doc: &'a Document, dict: &'a Dictionary) -> Vec<&'a [u8]> {
    match get(doc, dict, b"Filter") {
        Some(Object::Name(n)) => vec![n.as_slice()],
        Some(Object::Array(filters)) => filters
            .iter()
            .filter_map(|f| resolve(doc, f).ok().and_then(name))
            .collect(),
        _ => Vec::new(),
    }
}

//! Core domain types, summary segmentation, and shared errors for the
//! research locker conversion tools.

pub mod error;
pub mod segment;
pub mod types;

pub use error::{Error, Result};
pub use segment::SummarySegmenter;
pub use types::{
    ExtractionResult, GeneratePayload, HeadingMatch, Sections, SummarySection,
    CANONICAL_HEADINGS,
};

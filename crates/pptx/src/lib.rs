//! PPTX (Office Open XML) template filling.
//!
//! Opens a .pptx package, finds the slide whose title matches each summary
//! heading, and rewrites that slide's content region with bullet paragraphs.

pub mod filler;
pub mod matcher;
pub mod package;
pub mod parser;
pub mod presentation;
pub mod slide;
pub mod text;
mod xml;

pub use filler::{DeckFiller, FillReport};
pub use matcher::{select_content_region, ContentTarget, MatchKind, SlideIndex, SlideMatch};
pub use package::Package;
pub use parser::PptxParser;
pub use presentation::Presentation;
pub use slide::{Frame, Placeholder, Shape, ShapeKind, Slide};
pub use text::{Paragraph, TextBody, DEFAULT_FONT_SIZE};

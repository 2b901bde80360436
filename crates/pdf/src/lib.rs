//! Image and table extraction from PDF documents.
//!
//! Embedded images are written out in their native codec where possible.
//! Ruled tables are located with pdfplumber, dumped to temporary CSV, and
//! saved as padded PNG snapshots rendered through PDFium.

pub mod csv_export;
pub mod document;
pub mod extractor;
pub mod geometry;
pub mod images;
pub mod render;
pub mod tables;

pub use extractor::{TableExtractor, TABLE_PADDING, TABLE_ZOOM};
pub use geometry::Rect;
pub use images::{extract_images, EncodedImage};
pub use pdfplumber::TableSettings;
pub use render::{PageRasterizer, PdfiumLibrary, PdfiumRasterizer};
pub use tables::{DetectedTable, PageFrame, PageTables, TableDetector};

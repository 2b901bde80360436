//! Error types shared by the deck generator and the PDF extractor.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while filling decks or extracting PDF content.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open, read, or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The JSON payload could not be decoded.
    #[error("Invalid payload: {0}")]
    PayloadError(String),

    /// The heading list cannot be turned into a matcher.
    #[error("Invalid headings: {0}")]
    InvalidHeadings(String),

    /// Failed to interpret the PPTX package structure.
    #[error("PPTX structure error: {0}")]
    PptxError(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or writing error (for PPTX).
    #[error("XML error: {0}")]
    XmlError(String),

    /// Failed to load or walk a PDF document.
    #[error("PDF error: {0}")]
    PdfError(String),

    /// An embedded image could not be decoded or encoded.
    #[error("Image error: {0}")]
    ImageError(String),

    /// A page region could not be rasterized.
    #[error("Render error: {0}")]
    RenderError(String),

    /// The temporary table dump could not be written.
    #[error("CSV error: {0}")]
    CsvError(String),
}

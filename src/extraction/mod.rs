//! Plain-text extraction for uploaded documents.
//!
//! The declared file name decides the parser: `.docx` word-processor documents, `.pptx`
//! presentations and `.pdf` files. Output is the raw text the document carries, one paragraph,
//! shape or page per line. No normalization or size limiting happens here.

mod docx;
mod ooxml;
mod pdf;
mod pptx;

use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Errors raised while turning document bytes into text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// File name does not carry one of the supported extensions.
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),
    /// Office document is not a readable zip container.
    #[error("Failed to open document archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    /// An expected part is absent from the office document.
    #[error("Document part missing: {0}")]
    MissingPart(String),
    /// An XML part could not be parsed.
    #[error("Malformed document XML: {0}")]
    Xml(String),
    /// PDF library failed to produce text.
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    /// Reading a part from the archive failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<quick_xml::Error> for ExtractionError {
    fn from(error: quick_xml::Error) -> Self {
        Self::Xml(error.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for ExtractionError {
    fn from(error: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(error.to_string())
    }
}

/// Document formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Office Open XML word-processor document (`.docx`).
    Docx,
    /// Office Open XML presentation (`.pptx`).
    Pptx,
    /// Portable Document Format (`.pdf`).
    Pdf,
}

impl DocumentFormat {
    /// Resolve the format from a file name's extension, ignoring case.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let extension = Path::new(filename).extension()?.to_str()?;
        match extension.to_ascii_lowercase().as_str() {
            "docx" => Some(Self::Docx),
            "pptx" => Some(Self::Pptx),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Canonical lowercase extension for this format.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Pptx => "pptx",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Extract plain text from `bytes`, dispatching on the extension of `filename`.
pub fn extract_text(bytes: &[u8], filename: &str) -> Result<String, ExtractionError> {
    let format = DocumentFormat::from_filename(filename)
        .ok_or_else(|| ExtractionError::UnsupportedFormat(filename.to_string()))?;
    let text = match format {
        DocumentFormat::Docx => docx::extract_docx(bytes)?,
        DocumentFormat::Pptx => pptx::extract_pptx(bytes)?,
        DocumentFormat::Pdf => pdf::extract_pdf(bytes)?,
    };
    tracing::debug!(%format, chars = text.chars().count(), "Extracted document text");
    Ok(text)
}

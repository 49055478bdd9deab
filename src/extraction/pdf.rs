use super::ExtractionError;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Page texts in page order, one page per line.
///
/// The PDF text layer pads each page with layout newlines; those are stripped from the page
/// edges only.
pub(super) fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractionError> {
    // pdf-extract panics on some malformed inputs instead of returning an error.
    let pages = catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }))
    .map_err(|_| ExtractionError::Pdf("PDF parser aborted on malformed input".into()))?
    .map_err(|error| ExtractionError::Pdf(error.to_string()))?;

    tracing::trace!(pages = pages.len(), "Extracted PDF pages");
    Ok(pages
        .iter()
        .map(|page| page.trim())
        .collect::<Vec<_>>()
        .join("\n"))
}

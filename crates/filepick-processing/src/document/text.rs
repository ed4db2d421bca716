use crate::error::ProcessingError;
use std::panic::{self, AssertUnwindSafe};

/// Text of every page, concatenated in page order and trimmed.
///
/// A document without a text layer yields an empty string.
pub fn extract_text(data: &[u8]) -> Result<String, ProcessingError> {
    // The parser panics on some malformed inputs
    let pages = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(data)
    }))
    .map_err(|_| ProcessingError::ExtractionFailed("parser panicked".to_string()))?
    .map_err(|e| ProcessingError::ExtractionFailed(e.to_string()))?;

    Ok(pages.concat().trim().to_string())
}

use crate::batch::UploadedArtifact;
use crate::error::ProcessingError;
use serde::Serialize;

/// An input that produced no output
#[derive(Debug, Clone, Serialize)]
pub struct SkippedItem {
    pub index: usize,
    pub filename: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub successes: Vec<UploadedArtifact>,
    pub skipped: Vec<SkippedItem>,
}

impl BatchReport {
    pub fn urls(&self) -> Vec<String> {
        self.successes.iter().map(|a| a.url.clone()).collect()
    }

    pub(crate) fn skip(&mut self, index: usize, filename: &str, error: &ProcessingError) {
        tracing::warn!(
            index,
            filename = %filename,
            error = %error,
            upload = error.is_upload(),
            "Skipping batch item"
        );
        self.skipped.push(SkippedItem {
            index,
            filename: filename.to_string(),
            reason: error.to_string(),
        });
    }
}

/// Result of a batch run
#[derive(Debug)]
pub enum BatchOutcome {
    Uploaded(BatchReport),
    /// Text extraction result; nothing is uploaded
    Text(String),
}

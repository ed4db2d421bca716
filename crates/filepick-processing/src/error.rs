//! Processing errors
//!
//! One enum for the whole engine. Variants split into request-level validation failures
//! (raised before any item is touched), per-item failures (the item is skipped) and
//! failures that abort the whole batch regardless of where they happen.

use filepick_storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Unsupported input type: {0}")]
    UnsupportedInputType(String),

    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Missing required field: {0}")]
    MissingParameter(&'static str),

    #[error("Insufficient inputs: {0}")]
    InsufficientInputs(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Text extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Encoding failed: {0}")]
    Encode(String),

    #[error("Rasterization failed: {0}")]
    Rasterize(String),

    #[error("Upload failed: {0}")]
    Upload(#[from] StorageError),

    #[error("Processing task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProcessingError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ProcessingError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// Errors produced while reading request parameters, before any per-item work.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ProcessingError::InvalidDimension(_)
                | ProcessingError::UnsupportedFormat(_)
                | ProcessingError::UnsupportedFilter(_)
                | ProcessingError::InvalidParameter { .. }
                | ProcessingError::MissingParameter(_)
                | ProcessingError::InsufficientInputs(_)
        )
    }

    /// Errors that end the whole batch even when raised by a single item.
    pub fn aborts_batch(&self) -> bool {
        matches!(self, ProcessingError::DecryptionFailed(_))
    }

    pub fn is_upload(&self) -> bool {
        matches!(self, ProcessingError::Upload(_))
    }
}

impl From<tokio::task::JoinError> for ProcessingError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            ProcessingError::Task("transform panicked".to_string())
        } else {
            ProcessingError::Task(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(ProcessingError::UnsupportedFilter("vintage".into()).is_validation());
        assert!(ProcessingError::invalid("opacity", "must be 0-255").is_validation());
        assert!(!ProcessingError::UnsupportedInputType("gif".into()).is_validation());

        assert!(ProcessingError::DecryptionFailed("a.pdf".into()).aborts_batch());
        assert!(!ProcessingError::Encode("x".into()).aborts_batch());

        let upload = ProcessingError::from(StorageError::Timeout(30));
        assert!(upload.is_upload());
        assert!(!upload.is_validation());
    }

    #[test]
    fn test_invalid_parameter_message() {
        let err = ProcessingError::invalid("rotate", "must be one of 0, 90, 180, 270");
        assert_eq!(
            err.to_string(),
            "Invalid value for 'rotate': must be one of 0, 90, 180, 270"
        );
    }
}

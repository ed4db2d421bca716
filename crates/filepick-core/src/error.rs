//! Application errors.
//!
//! Storage and processing keep their own `thiserror` enums; the API layer maps them into
//! [`AppError`], which knows how it should be rendered and logged.

use std::io;

/// Level an error is logged at when it reaches the HTTP layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Rejected requests
    Debug,
    /// Bad inputs that got past validation
    Warn,
    Error,
}

/// How an error presents itself to API clients.
pub trait ErrorMetadata {
    fn http_status_code(&self) -> u16;

    /// Stable machine-readable code, e.g. `UNSUPPORTED_FORMAT`
    fn error_code(&self) -> &'static str;

    /// Retrying the same request may succeed
    fn is_recoverable(&self) -> bool;

    fn suggested_action(&self) -> Option<&'static str>;

    /// Message safe to show to the caller
    fn client_message(&self) -> String;

    /// Internal details must not be returned, even outside production
    fn is_sensitive(&self) -> bool;

    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    #[error("Insufficient inputs: {0}")]
    InsufficientInputs(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Text extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("PDF processing error: {0}")]
    PdfProcessing(String),

    #[error("Media conversion error: {0}")]
    MediaConversionError(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("I/O failure: {}", err))
    }
}

/// (status, code, recoverable, suggested action, sensitive, log level) per variant
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::UnsupportedFormat(_) => (
            400,
            "UNSUPPORTED_FORMAT",
            false,
            Some("Use one of JPEG, PNG, WEBP, BMP, TIFF or ICO"),
            false,
            LogLevel::Debug,
        ),
        AppError::UnsupportedFilter(_) => (
            400,
            "UNSUPPORTED_FILTER",
            false,
            Some("Use one of grayscale, sepia, sharpen, blur, contrast, brightness or edge"),
            false,
            LogLevel::Debug,
        ),
        AppError::InsufficientInputs(_) => (
            400,
            "INSUFFICIENT_INPUTS",
            false,
            Some("Upload the required number of files"),
            false,
            LogLevel::Debug,
        ),
        AppError::DecryptionFailed(_) => (
            400,
            "DECRYPTION_FAILED",
            false,
            Some("Check the document password"),
            false,
            LogLevel::Warn,
        ),
        AppError::ExtractionFailed(_) => (
            500,
            "EXTRACTION_FAILED",
            false,
            Some("Check that the file is a readable PDF"),
            false,
            LogLevel::Warn,
        ),
        AppError::ImageProcessing(_) => (
            400,
            "IMAGE_PROCESSING_ERROR",
            false,
            Some("Upload a decodable JPEG, PNG, WEBP, BMP, TIFF or GIF image"),
            false,
            LogLevel::Warn,
        ),
        AppError::PdfProcessing(_) => (
            500,
            "PDF_PROCESSING_ERROR",
            false,
            Some("Check that every file is a readable PDF"),
            false,
            LogLevel::Warn,
        ),
        AppError::MediaConversionError(_) => (
            500,
            "MEDIA_CONVERSION_ERROR",
            false,
            Some("Check that the upload is a valid file of the expected type"),
            false,
            LogLevel::Error,
        ),
        AppError::Storage(_) => (
            500,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::PayloadTooLarge(_) => (
            413,
            "PAYLOAD_TOO_LARGE",
            false,
            Some("Reduce file size or split the batch"),
            false,
            LogLevel::Debug,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Variant name, logged next to the code
    pub fn error_type(&self) -> &str {
        match self {
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::UnsupportedFormat(_) => "UnsupportedFormat",
            AppError::UnsupportedFilter(_) => "UnsupportedFilter",
            AppError::InsufficientInputs(_) => "InsufficientInputs",
            AppError::DecryptionFailed(_) => "DecryptionFailed",
            AppError::ExtractionFailed(_) => "ExtractionFailed",
            AppError::ImageProcessing(_) => "ImageProcessing",
            AppError::PdfProcessing(_) => "PdfProcessing",
            AppError::MediaConversionError(_) => "MediaConversionError",
            AppError::Storage(_) => "Storage",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Display text followed by up to five `Caused by` lines from the source chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidInput(ref msg)
            | AppError::UnsupportedFormat(ref msg)
            | AppError::UnsupportedFilter(ref msg)
            | AppError::InsufficientInputs(ref msg)
            | AppError::DecryptionFailed(ref msg)
            | AppError::ExtractionFailed(ref msg)
            | AppError::ImageProcessing(ref msg)
            | AppError::PdfProcessing(ref msg)
            | AppError::MediaConversionError(ref msg)
            | AppError::PayloadTooLarge(ref msg) => msg.clone(),
            AppError::Storage(_) => "Failed to store the result".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_validation() {
        let err = AppError::UnsupportedFilter("Unsupported filter: vintage".to_string());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "UNSUPPORTED_FILTER");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "Unsupported filter: vintage");
        assert!(!err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_decryption_failed() {
        let err = AppError::DecryptionFailed("incorrect password".to_string());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "DECRYPTION_FAILED");
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_error_metadata_storage_hides_details() {
        let err = AppError::Storage("bucket policy denied upload".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert!(err.is_recoverable());
        assert!(err.is_sensitive());
        assert_eq!(err.client_message(), "Failed to store the result");
    }

    #[test]
    fn test_internal_with_source_chain() {
        let err = AppError::from(anyhow::anyhow!("disk full").context("writing temp file"));
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.client_message(), "Internal server error");
        assert!(err.detailed_message().contains("Caused by"));
    }

    #[test]
    fn test_payload_too_large() {
        let err = AppError::PayloadTooLarge("body exceeds 50 MB".to_string());
        assert_eq!(err.http_status_code(), 413);
        assert_eq!(err.error_code(), "PAYLOAD_TOO_LARGE");
        assert_eq!(err.client_message(), "body exceeds 50 MB");
        assert!(err.suggested_action().is_some());
    }
}

//! Error responses
//!
//! Handlers return `Result<_, HttpAppError>`. Errors from the storage and processing
//! crates convert into `AppError` here, which decides the status code, the client message
//! and the log level.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use filepick_core::{AppError, ErrorMetadata, LogLevel};
use filepick_processing::{ConverterError, ProcessingError};
use filepick_storage::StorageError;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Stable code such as `DECRYPTION_FAILED`
    pub code: String,
    /// Whether retrying the same request may succeed
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// `AppError` rendered as a JSON error body
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::from(err))
    }
}

fn log_error(error: &AppError) {
    let kind = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, kind, "Request failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, kind, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, kind, "Request failed");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .map(|env| matches!(env.to_lowercase().as_str(), "production" | "prod"))
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;
        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let details = if is_production_env() || app_error.is_sensitive() {
            None
        } else {
            Some(app_error.detailed_message())
        };

        let body = Json(ErrorResponse {
            error: app_error.client_message(),
            code: app_error.error_code().to_string(),
            recoverable: app_error.is_recoverable(),
            suggested_action: app_error.suggested_action().map(String::from),
            details,
        });

        (status, body).into_response()
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        HttpAppError(AppError::Storage(err.to_string()))
    }
}

impl From<ProcessingError> for HttpAppError {
    fn from(err: ProcessingError) -> Self {
        let message = err.to_string();
        let app = match err {
            ProcessingError::InvalidDimension(_)
            | ProcessingError::InvalidParameter { .. }
            | ProcessingError::MissingParameter(_)
            | ProcessingError::UnsupportedInputType(_) => AppError::InvalidInput(message),
            ProcessingError::UnsupportedFormat(_) => AppError::UnsupportedFormat(message),
            ProcessingError::UnsupportedFilter(_) => AppError::UnsupportedFilter(message),
            ProcessingError::InsufficientInputs(_) => AppError::InsufficientInputs(message),
            ProcessingError::DecryptionFailed(_) => AppError::DecryptionFailed(message),
            ProcessingError::ExtractionFailed(_) => AppError::ExtractionFailed(message),
            ProcessingError::Image(_) => AppError::ImageProcessing(message),
            ProcessingError::Pdf(_) => AppError::PdfProcessing(message),
            ProcessingError::Rasterize(_) => AppError::MediaConversionError(message),
            ProcessingError::Upload(e) => return e.into(),
            ProcessingError::Encode(_) | ProcessingError::Task(_) | ProcessingError::Io(_) => {
                AppError::Internal(message)
            }
        };
        HttpAppError(app)
    }
}

impl From<ConverterError> for HttpAppError {
    fn from(err: ConverterError) -> Self {
        let app = match err {
            ConverterError::UnsupportedExtension { .. } => AppError::InvalidInput(err.to_string()),
            ConverterError::ToolFailed { .. } | ConverterError::MissingOutput { .. } => {
                AppError::MediaConversionError(err.to_string())
            }
            ConverterError::Spawn { .. } | ConverterError::Io(_) => {
                AppError::Internal(err.to_string())
            }
        };
        HttpAppError(app)
    }
}

impl From<MultipartError> for HttpAppError {
    fn from(err: MultipartError) -> Self {
        let app = if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(err.body_text())
        } else {
            AppError::InvalidInput(format!("Failed to read multipart: {}", err.body_text()))
        };
        HttpAppError(app)
    }
}

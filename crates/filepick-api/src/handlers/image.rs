//! Image batch routes (multipart field `images`)

use super::run_batch;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::extract::{Multipart, State};
use axum::Json;
use filepick_processing::OperationKind;
use serde_json::Value;
use std::sync::Arc;

/// Resize every image to exactly `width` x `height` (PNG output).
#[utoipa::path(
    post,
    path = "/api/image/resize",
    tag = "image",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "`resized_urls` of the results"),
        (status = 400, description = "Invalid parameters or missing files", body = ErrorResponse),
        (status = 500, description = "Processing or upload failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "resize_images"))]
pub async fn resize_images(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, HttpAppError> {
    run_batch(&state, OperationKind::Resize, multipart).await
}

/// Re-encode every image (or every page of a PDF) to `format`.
#[utoipa::path(
    post,
    path = "/api/image/convert",
    tag = "image",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "`converted_urls` of the results"),
        (status = 400, description = "Invalid parameters or missing files", body = ErrorResponse),
        (status = 500, description = "Processing or upload failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "convert_images"))]
pub async fn convert_images(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, HttpAppError> {
    run_batch(&state, OperationKind::Convert, multipart).await
}

/// Recompress JPEG, PNG and WEBP images at the `quality` preset.
#[utoipa::path(
    post,
    path = "/api/image/compress",
    tag = "image",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "`compressed_urls` of the results"),
        (status = 400, description = "Invalid parameters or missing files", body = ErrorResponse),
        (status = 500, description = "Processing or upload failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "compress_images"))]
pub async fn compress_images(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, HttpAppError> {
    run_batch(&state, OperationKind::CompressImage, multipart).await
}

/// Apply a named color or convolution `filter`.
#[utoipa::path(
    post,
    path = "/api/image/filter",
    tag = "image",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "`filtered_urls` of the results"),
        (status = 400, description = "Invalid parameters or missing files", body = ErrorResponse),
        (status = 500, description = "Processing or upload failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "filter_images"))]
pub async fn filter_images(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, HttpAppError> {
    run_batch(&state, OperationKind::Filter, multipart).await
}

/// Stamp a text or image watermark on every image.
#[utoipa::path(
    post,
    path = "/api/image/watermark",
    tag = "image",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "`watermarked_urls` of the results"),
        (status = 400, description = "Invalid parameters or missing files", body = ErrorResponse),
        (status = 500, description = "Processing or upload failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "watermark_images"))]
pub async fn watermark_images(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, HttpAppError> {
    run_batch(&state, OperationKind::Watermark, multipart).await
}

/// Re-encode every image without its metadata.
#[utoipa::path(
    post,
    path = "/api/image/remove-exif",
    tag = "image",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "`cleaned_urls` of the results"),
        (status = 400, description = "Invalid parameters or missing files", body = ErrorResponse),
        (status = 500, description = "Processing or upload failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "remove_exif"))]
pub async fn remove_exif(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, HttpAppError> {
    run_batch(&state, OperationKind::StripExif, multipart).await
}

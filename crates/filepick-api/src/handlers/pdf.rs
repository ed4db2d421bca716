//! PDF batch routes (multipart field `files`, or `file` for text extraction)

use super::run_batch;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::extract::{Multipart, State};
use axum::Json;
use filepick_processing::OperationKind;
use serde_json::Value;
use std::sync::Arc;

/// Concatenate every page of every file, in upload order.
#[utoipa::path(
    post,
    path = "/api/pdf/merge",
    tag = "pdf",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "`merged_url` of the results"),
        (status = 400, description = "Invalid parameters or missing files", body = ErrorResponse),
        (status = 500, description = "Processing or upload failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "merge_pdfs"))]
pub async fn merge_pdfs(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, HttpAppError> {
    run_batch(&state, OperationKind::Merge, multipart).await
}

/// Keep the pages listed in `pages` (0-based), in the given order.
#[utoipa::path(
    post,
    path = "/api/pdf/split",
    tag = "pdf",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "`split_urls` of the results"),
        (status = 400, description = "Invalid parameters or missing files", body = ErrorResponse),
        (status = 500, description = "Processing or upload failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "split_pdfs"))]
pub async fn split_pdfs(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, HttpAppError> {
    run_batch(&state, OperationKind::Split, multipart).await
}

/// Rebuild each PDF without metadata or unreferenced objects.
#[utoipa::path(
    post,
    path = "/api/pdf/compress",
    tag = "pdf",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "`compressed_urls` of the results"),
        (status = 400, description = "Invalid parameters or missing files", body = ErrorResponse),
        (status = 500, description = "Processing or upload failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "compress_pdfs"))]
pub async fn compress_pdfs(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, HttpAppError> {
    run_batch(&state, OperationKind::CompressPdf, multipart).await
}

/// Drop the `delete_pages` pages and set the rotation of the rest to `rotate`.
#[utoipa::path(
    post,
    path = "/api/pdf/rotate-delete",
    tag = "pdf",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "`processed_urls` of the results"),
        (status = 400, description = "Invalid parameters or missing files", body = ErrorResponse),
        (status = 500, description = "Processing or upload failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "rotate_delete_pages"))]
pub async fn rotate_delete_pages(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, HttpAppError> {
    run_batch(&state, OperationKind::RotateDelete, multipart).await
}

/// Add or remove a password from every PDF.
#[utoipa::path(
    post,
    path = "/api/pdf/encrypt-decrypt",
    tag = "pdf",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "`result_urls` of the results"),
        (status = 400, description = "Invalid parameters or missing files", body = ErrorResponse),
        (status = 400, description = "Wrong password", body = ErrorResponse),
        (status = 500, description = "Processing or upload failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "encrypt_decrypt_pdfs"))]
pub async fn encrypt_decrypt_pdfs(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, HttpAppError> {
    run_batch(&state, OperationKind::EncryptDecrypt, multipart).await
}

/// Extract the text of a PDF.
#[utoipa::path(
    post,
    path = "/api/pdf/extract-text",
    tag = "pdf",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "`extracted_text` of the results"),
        (status = 400, description = "Invalid parameters or missing files", body = ErrorResponse),
        (status = 500, description = "Processing or upload failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "extract_text"))]
pub async fn extract_text(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, HttpAppError> {
    run_batch(&state, OperationKind::ExtractText, multipart).await
}

//! Converter routes: office documents to PDF, MOV to MP4, MP4 to MP3.
//!
//! Each route takes one `file` part and answers with the public URL of the result.

use crate::error::{ErrorResponse, HttpAppError};
use crate::multipart::read_single_file;
use crate::state::AppState;
use axum::extract::{Multipart, State};
use axum::Json;
use filepick_processing::converter::media::{MOV_TO_MP4_FOLDER, MP4_TO_MP3_FOLDER};
use filepick_processing::{OfficeFormat, OperationFamily};
use serde_json::{json, Value};
use std::sync::Arc;

async fn office_to_pdf(
    state: &AppState,
    format: OfficeFormat,
    multipart: Multipart,
) -> Result<Json<Value>, HttpAppError> {
    let input = read_single_file(multipart).await?;
    let artifact = state.office.to_pdf(format, &input).await?;
    let uploaded = state
        .publisher()
        .persist(OperationFamily::Converted, format.folder(), artifact)
        .await?;
    Ok(Json(json!({ "converted_url": uploaded.url })))
}

#[utoipa::path(
    post,
    path = "/api/convert/docx-to-pdf",
    tag = "convert",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "`converted_url` of the PDF"),
        (status = 400, description = "Missing file or not a .docx", body = ErrorResponse),
        (status = 500, description = "LibreOffice failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart))]
pub async fn docx_to_pdf(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, HttpAppError> {
    office_to_pdf(&state, OfficeFormat::Docx, multipart).await
}

#[utoipa::path(
    post,
    path = "/api/convert/ppt-to-pdf",
    tag = "convert",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "`converted_url` of the PDF"),
        (status = 400, description = "Missing file or not a .ppt/.pptx", body = ErrorResponse),
        (status = 500, description = "LibreOffice failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart))]
pub async fn ppt_to_pdf(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, HttpAppError> {
    office_to_pdf(&state, OfficeFormat::Ppt, multipart).await
}

#[utoipa::path(
    post,
    path = "/api/convert/excel-to-pdf",
    tag = "convert",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "`converted_url` of the PDF"),
        (status = 400, description = "Missing file or not a .xls/.xlsx", body = ErrorResponse),
        (status = 500, description = "LibreOffice failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart))]
pub async fn excel_to_pdf(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, HttpAppError> {
    office_to_pdf(&state, OfficeFormat::Excel, multipart).await
}

/// Transcode a QuickTime movie to H.264/AAC MP4.
#[utoipa::path(
    post,
    path = "/api/convert/mov-to-mp4",
    tag = "convert",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "`url` of the MP4"),
        (status = 400, description = "Missing file or not a .mov", body = ErrorResponse),
        (status = 500, description = "FFmpeg failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart))]
pub async fn mov_to_mp4(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, HttpAppError> {
    let input = read_single_file(multipart).await?;
    let artifact = state.media.mov_to_mp4(&input).await?;
    let uploaded = state
        .publisher()
        .persist(OperationFamily::Converted, MOV_TO_MP4_FOLDER, artifact)
        .await?;
    Ok(Json(json!({ "url": uploaded.url })))
}

/// Extract the audio track of an MP4 as MP3.
#[utoipa::path(
    post,
    path = "/api/convert/mp4-to-mp3",
    tag = "convert",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "`url` of the MP3"),
        (status = 400, description = "Missing file or not a .mp4", body = ErrorResponse),
        (status = 500, description = "FFmpeg failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart))]
pub async fn mp4_to_mp3(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, HttpAppError> {
    let input = read_single_file(multipart).await?;
    let artifact = state.media.mp4_to_mp3(&input).await?;
    let uploaded = state
        .publisher()
        .persist(OperationFamily::Converted, MP4_TO_MP3_FOLDER, artifact)
        .await?;
    Ok(Json(json!({ "url": uploaded.url })))
}

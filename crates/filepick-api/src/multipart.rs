//! Multipart form extraction
//!
//! Batch routes send their inputs as repeated file parts under one field name plus flat
//! text fields for the parameters. Converter routes send exactly one part named `file`.

use crate::error::HttpAppError;
use axum::extract::multipart::Field;
use axum::extract::Multipart;
use filepick_core::AppError;
use filepick_processing::batch::WATERMARK_IMAGE_FIELD;
use filepick_processing::{InputFile, OperationKind, TransformRequest};

/// Field name converter routes read their upload from
pub const SINGLE_FILE_FIELD: &str = "file";

async fn read_file(field: Field<'_>) -> Result<Option<InputFile>, HttpAppError> {
    let filename = field.file_name().unwrap_or_default().to_string();
    let data = field.bytes().await?;

    // Browsers submit an empty, unnamed part for a file input left blank
    if filename.is_empty() && data.is_empty() {
        return Ok(None);
    }
    Ok(Some(InputFile::new(filename, data)))
}

/// Collect the form into a request for `kind`.
///
/// Unknown file fields are ignored; text fields become parameters. Nothing is validated
/// here beyond reading the body.
pub async fn read_transform_request(
    kind: OperationKind,
    mut multipart: Multipart,
) -> Result<TransformRequest, HttpAppError> {
    let files_field = kind.files_field();
    let mut request = TransformRequest::new(kind);

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if field.file_name().is_some() {
            let Some(file) = read_file(field).await? else {
                continue;
            };
            if name == files_field {
                request = request.with_input(file);
            } else if name == WATERMARK_IMAGE_FIELD {
                request = request.with_attachment(name, file);
            } else {
                tracing::debug!(field = %name, "Ignoring unexpected file field");
            }
        } else {
            let value = field.text().await?;
            request = request.with_param(name, value);
        }
    }

    tracing::debug!(
        inputs = request.inputs.len(),
        params = request.params.len(),
        "Read multipart form"
    );
    Ok(request)
}

/// Read the single `file` part of a converter upload.
pub async fn read_single_file(mut multipart: Multipart) -> Result<InputFile, HttpAppError> {
    let mut file = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(SINGLE_FILE_FIELD) {
            continue;
        }
        if file.is_some() {
            return Err(AppError::InvalidInput(
                "Multiple file fields are not allowed; send exactly one field named 'file'"
                    .to_string(),
            )
            .into());
        }
        file = read_file(field).await?;
    }

    file.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()).into())
}

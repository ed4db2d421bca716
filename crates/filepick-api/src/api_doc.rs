//! OpenAPI documentation, served at `/api/openapi.json` and browsable under `/docs`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "FilePick API",
        version = "0.1.0",
        description = "Batch image and PDF transformations plus office, audio and video converters. Every route takes multipart uploads and answers with the public URLs of the stored results."
    ),
    paths(
        handlers::health::health_check,
        // Images
        handlers::image::resize_images,
        handlers::image::convert_images,
        handlers::image::compress_images,
        handlers::image::filter_images,
        handlers::image::watermark_images,
        handlers::image::remove_exif,
        // PDF
        handlers::pdf::merge_pdfs,
        handlers::pdf::split_pdfs,
        handlers::pdf::compress_pdfs,
        handlers::pdf::rotate_delete_pages,
        handlers::pdf::encrypt_decrypt_pdfs,
        handlers::pdf::extract_text,
        // Converters
        handlers::convert::docx_to_pdf,
        handlers::convert::ppt_to_pdf,
        handlers::convert::excel_to_pdf,
        handlers::convert::mov_to_mp4,
        handlers::convert::mp4_to_mp3,
    ),
    components(schemas(error::ErrorResponse)),
    tags(
        (name = "image", description = "Batch image transformations"),
        (name = "pdf", description = "Batch PDF page operations"),
        (name = "convert", description = "Single-file converters"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;

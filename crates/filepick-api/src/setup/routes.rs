//! Route configuration and setup

use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use filepick_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

const DEFAULT_CONCURRENCY_LIMIT: usize = 64;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    let max_upload_bytes = config.max_upload_bytes();

    // Requests in flight, each holding its whole upload in memory
    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_CONCURRENCY_LIMIT)
        .max(1);

    let app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::ApiDoc::openapi()) }),
        )
        .merge(image_routes())
        .merge(pdf_routes())
        .merge(convert_routes())
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        // Multipart bodies are capped by the extractor limit; the layer rejects oversized
        // bodies before they are read at all
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!(
        max_upload_bytes,
        http_concurrency_limit,
        "Routes configured"
    );
    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        if config.is_production() {
            tracing::warn!("CORS configured to allow all origins - not recommended for production");
        }
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}

fn image_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/image/resize", post(handlers::image::resize_images))
        .route("/api/image/convert", post(handlers::image::convert_images))
        .route("/api/image/compress", post(handlers::image::compress_images))
        .route("/api/image/filter", post(handlers::image::filter_images))
        .route("/api/image/watermark", post(handlers::image::watermark_images))
        .route("/api/image/remove-exif", post(handlers::image::remove_exif))
}

fn pdf_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/pdf/merge", post(handlers::pdf::merge_pdfs))
        .route("/api/pdf/split", post(handlers::pdf::split_pdfs))
        .route("/api/pdf/compress", post(handlers::pdf::compress_pdfs))
        .route(
            "/api/pdf/rotate-delete",
            post(handlers::pdf::rotate_delete_pages),
        )
        .route(
            "/api/pdf/encrypt-decrypt",
            post(handlers::pdf::encrypt_decrypt_pdfs),
        )
        .route("/api/pdf/extract-text", post(handlers::pdf::extract_text))
}

fn convert_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/convert/docx-to-pdf", post(handlers::convert::docx_to_pdf))
        .route("/api/convert/ppt-to-pdf", post(handlers::convert::ppt_to_pdf))
        .route("/api/convert/excel-to-pdf", post(handlers::convert::excel_to_pdf))
        .route("/api/convert/mov-to-mp4", post(handlers::convert::mov_to_mp4))
        .route("/api/convert/mp4-to-mp3", post(handlers::convert::mp4_to_mp3))
}

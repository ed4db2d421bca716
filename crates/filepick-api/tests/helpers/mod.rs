//! Test helpers: build AppState and router for integration tests.
//!
//! The blob store is in memory and PDF rasterization is faked, so no external services
//! or binaries are needed. Run with `cargo test -p filepick-api`.

#![allow(dead_code)]

pub mod fixtures;
pub mod storage;

use async_trait::async_trait;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use bytes::Bytes;
use filepick_api::setup::routes;
use filepick_api::AppState;
use filepick_core::Config;
use filepick_processing::{PageRasterizer, ProcessingError};
use std::collections::HashMap;
use std::sync::Arc;

pub use storage::MemoryStorage;

/// Rasterizer returning `pages` small PNGs for any document
pub struct FakeRasterizer {
    pub pages: usize,
}

#[async_trait]
impl PageRasterizer for FakeRasterizer {
    async fn rasterize(&self, _pdf: Bytes) -> Result<Vec<Bytes>, ProcessingError> {
        Ok((0..self.pages)
            .map(|_| Bytes::from(fixtures::create_test_png(40, 30)))
            .collect())
    }
}

/// Test application: server plus the blob store behind it.
pub struct TestApp {
    pub server: TestServer,
    pub storage: Arc<MemoryStorage>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(&[]).await
}

/// Setup a test app with extra configuration variables.
pub async fn setup_test_app_with(vars: &[(&str, &str)]) -> TestApp {
    let mut env: HashMap<String, String> = HashMap::from([
        ("STORAGE_BACKEND".to_string(), "local".to_string()),
        ("MAX_UPLOAD_MB".to_string(), "5".to_string()),
    ]);
    for (key, value) in vars {
        env.insert(key.to_string(), value.to_string());
    }
    let config = Config::from_lookup(|key| env.get(key).cloned()).expect("Invalid test config");

    let storage = Arc::new(MemoryStorage::default());
    let state = Arc::new(AppState::with_rasterizer(
        config.clone(),
        storage.clone(),
        Arc::new(FakeRasterizer { pages: 2 }),
    ));
    let app = routes::setup_routes(&config, state).expect("Failed to build routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp { server, storage }
}

pub fn file_part(data: Vec<u8>, filename: &str, mime_type: &str) -> Part {
    Part::bytes(Bytes::from(data))
        .file_name(filename.to_string())
        .mime_type(mime_type.to_string())
}

pub fn png_part(filename: &str) -> Part {
    file_part(fixtures::create_test_png(64, 48), filename, "image/png")
}

pub fn pdf_part(filename: &str, widths: &[i64]) -> Part {
    file_part(fixtures::create_test_pdf(widths), filename, "application/pdf")
}

/// Form with one `images` part per filename
pub fn image_form(filenames: &[&str]) -> MultipartForm {
    filenames
        .iter()
        .fold(MultipartForm::new(), |form, name| form.add_part("images", png_part(name)))
}

/// String values of a JSON array response field
pub fn urls(body: &serde_json::Value, key: &str) -> Vec<String> {
    body[key]
        .as_array()
        .unwrap_or_else(|| panic!("expected '{}' array in {}", key, body))
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

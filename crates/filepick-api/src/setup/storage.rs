//! Storage setup and initialization

use anyhow::{Context, Result};
use filepick_core::Config;
use filepick_storage::{create_storage, Storage};
use std::sync::Arc;

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!("Initializing storage abstraction...");
    let storage = create_storage(config)
        .await
        .context("Failed to initialize blob storage")?;

    let buckets = config.buckets();
    tracing::info!(
        backend = ?storage.backend_type(),
        image_bucket = %buckets.images,
        pdf_bucket = %buckets.pdf,
        converted_bucket = %buckets.converted,
        upload_timeout_secs = config.upload_timeout().as_secs(),
        "Storage abstraction initialized successfully"
    );
    Ok(storage)
}

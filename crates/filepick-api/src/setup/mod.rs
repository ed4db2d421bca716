//! Application setup and initialization

pub mod routes;
pub mod server;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use filepick_core::Config;
use std::sync::Arc;

/// Validate the configuration, connect the blob store and build the router.
///
/// Telemetry must already be initialized.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;
    tracing::info!(
        environment = %config.environment(),
        backend = %config.storage_backend(),
        "Configuration loaded and validated successfully"
    );

    let storage = storage::setup_storage(&config).await?;
    let state = Arc::new(AppState::new(config.clone(), storage));
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}

//! Configuration module
//!
//! This module provides configuration structures for the API server, the blob store
//! backends and the external tools used by the processing crate. Everything is read
//! from the environment (optionally seeded from a `.env` file).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CONVERTED_BUCKET, DEFAULT_FFMPEG_PATH, DEFAULT_IMAGE_BUCKET, DEFAULT_PDFTOPPM_PATH,
    DEFAULT_PDF_BUCKET, DEFAULT_SOFFICE_PATH,
};
use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 3000;
const MAX_UPLOAD_MB: usize = 50;
const UPLOAD_TIMEOUT_SECS: u64 = 30;

/// HTTP server settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub max_upload_bytes: usize,
    /// `json` switches the log formatter to JSON lines
    pub log_format: String,
}

/// Blob store backend settings
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub supabase_url: Option<String>,
    pub supabase_service_key: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, R2, ...)
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub upload_timeout_secs: u64,
}

/// Logical buckets, one per operation family
#[derive(Clone, Debug)]
pub struct BucketConfig {
    pub images: String,
    pub pdf: String,
    pub converted: String,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            images: DEFAULT_IMAGE_BUCKET.to_string(),
            pdf: DEFAULT_PDF_BUCKET.to_string(),
            converted: DEFAULT_CONVERTED_BUCKET.to_string(),
        }
    }
}

/// External tools and processing behaviour
#[derive(Clone, Debug)]
pub struct ProcessingConfig {
    pub watermark_font_path: Option<PathBuf>,
    pub soffice_path: String,
    pub ffmpeg_path: String,
    pub pdftoppm_path: String,
    /// Adds a `skipped` array next to the result URLs in batch responses
    pub report_skipped_items: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            watermark_font_path: None,
            soffice_path: DEFAULT_SOFFICE_PATH.to_string(),
            ffmpeg_path: DEFAULT_FFMPEG_PATH.to_string(),
            pdftoppm_path: DEFAULT_PDFTOPPM_PATH.to_string(),
            report_skipped_items: false,
        }
    }
}

/// Full application configuration
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub base: BaseConfig,
    pub storage: StorageConfig,
    pub buckets: BucketConfig,
    pub processing: ProcessingConfig,
}

/// Application configuration handle.
#[derive(Clone, Debug)]
pub struct Config(pub Box<AppConfig>);

impl Config {
    fn inner(&self) -> &AppConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.inner().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = non_empty("ENVIRONMENT")
            .or_else(|| non_empty("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins = non_empty("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_upload_mb = non_empty("MAX_UPLOAD_MB")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(MAX_UPLOAD_MB);

        let base = BaseConfig {
            server_port: non_empty("SERVER_PORT")
                .or_else(|| non_empty("PORT"))
                .and_then(|v| v.parse().ok())
                .unwrap_or(SERVER_PORT),
            cors_origins,
            environment,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            log_format: non_empty("LOG_FORMAT").unwrap_or_else(|| "text".to_string()),
        };

        let backend = match non_empty("STORAGE_BACKEND") {
            Some(value) => value.parse::<StorageBackend>()?,
            None => StorageBackend::Supabase,
        };

        let storage = StorageConfig {
            backend,
            supabase_url: non_empty("SUPABASE_URL"),
            supabase_service_key: non_empty("SUPABASE_SERVICE_KEY"),
            s3_bucket: non_empty("S3_BUCKET"),
            s3_region: non_empty("S3_REGION").or_else(|| non_empty("AWS_REGION")),
            s3_endpoint: non_empty("S3_ENDPOINT"),
            local_storage_path: non_empty("LOCAL_STORAGE_PATH"),
            local_storage_base_url: non_empty("LOCAL_STORAGE_BASE_URL"),
            upload_timeout_secs: non_empty("UPLOAD_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(UPLOAD_TIMEOUT_SECS),
        };

        let defaults = BucketConfig::default();
        let buckets = BucketConfig {
            images: non_empty("IMAGE_BUCKET").unwrap_or(defaults.images),
            pdf: non_empty("PDF_BUCKET").unwrap_or(defaults.pdf),
            converted: non_empty("CONVERTED_BUCKET").unwrap_or(defaults.converted),
        };

        let tool_defaults = ProcessingConfig::default();
        let processing = ProcessingConfig {
            watermark_font_path: non_empty("WATERMARK_FONT_PATH").map(PathBuf::from),
            soffice_path: non_empty("SOFFICE_PATH").unwrap_or(tool_defaults.soffice_path),
            ffmpeg_path: non_empty("FFMPEG_PATH").unwrap_or(tool_defaults.ffmpeg_path),
            pdftoppm_path: non_empty("PDFTOPPM_PATH").unwrap_or(tool_defaults.pdftoppm_path),
            report_skipped_items: non_empty("REPORT_SKIPPED_ITEMS")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        };

        Ok(Config(Box::new(AppConfig {
            base,
            storage,
            buckets,
            processing,
        })))
    }

    /// Check backend-specific requirements. Fails fast on misconfiguration.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let storage = &self.inner().storage;

        if storage.upload_timeout_secs == 0 {
            return Err(anyhow::anyhow!("UPLOAD_TIMEOUT_SECS must be greater than zero"));
        }

        match storage.backend {
            StorageBackend::Supabase => {
                if storage.supabase_url.is_none() || storage.supabase_service_key.is_none() {
                    return Err(anyhow::anyhow!(
                        "SUPABASE_URL and SUPABASE_SERVICE_KEY must be set when using Supabase storage backend"
                    ));
                }
            }
            StorageBackend::S3 => {
                if storage.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if storage.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if storage.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if storage.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.inner().base.max_upload_bytes
    }

    pub fn json_logs(&self) -> bool {
        self.inner().base.log_format.eq_ignore_ascii_case("json")
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage.backend
    }

    pub fn supabase_url(&self) -> Option<&str> {
        self.inner().storage.supabase_url.as_deref()
    }

    pub fn supabase_service_key(&self) -> Option<&str> {
        self.inner().storage.supabase_service_key.as_deref()
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().storage.s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().storage.s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().storage.s3_endpoint.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().storage.local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().storage.local_storage_base_url.as_deref()
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.inner().storage.upload_timeout_secs)
    }

    pub fn buckets(&self) -> &BucketConfig {
        &self.inner().buckets
    }

    pub fn processing(&self) -> &ProcessingConfig {
        &self.inner().processing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.server_port(), 3000);
        assert_eq!(config.storage_backend(), StorageBackend::Supabase);
        assert_eq!(config.buckets().images, "images");
        assert_eq!(config.buckets().pdf, "pdf-files");
        assert_eq!(config.buckets().converted, "converted-files");
        assert_eq!(config.upload_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_upload_bytes(), 50 * 1024 * 1024);
        assert_eq!(config.processing().ffmpeg_path, "ffmpeg");
        assert!(!config.processing().report_skipped_items);
        assert!(!config.is_production());
    }

    #[test]
    fn test_supabase_requires_credentials() {
        let config = config_from(&[("SUPABASE_URL", "https://x.supabase.co")]).unwrap();
        assert!(config.validate().is_err());

        let config = config_from(&[
            ("SUPABASE_URL", "https://x.supabase.co"),
            ("SUPABASE_SERVICE_KEY", "secret"),
        ])
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_s3_region_falls_back_to_aws_region() {
        let config = config_from(&[
            ("STORAGE_BACKEND", "s3"),
            ("S3_BUCKET", "filepick"),
            ("AWS_REGION", "eu-west-1"),
        ])
        .unwrap();
        assert_eq!(config.s3_region(), Some("eu-west-1"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_local_backend_requires_path_and_url() {
        let config = config_from(&[
            ("STORAGE_BACKEND", "local"),
            ("LOCAL_STORAGE_PATH", "/tmp/filepick"),
        ])
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_backend_is_rejected() {
        assert!(config_from(&[("STORAGE_BACKEND", "ftp")]).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("ENVIRONMENT", "production"),
            ("SERVER_PORT", "8080"),
            ("PDF_BUCKET", "documents"),
            ("REPORT_SKIPPED_ITEMS", "true"),
            ("WATERMARK_FONT_PATH", "/fonts/DejaVuSans.ttf"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();
        assert!(config.is_production());
        assert!(config.json_logs());
        assert_eq!(config.server_port(), 8080);
        assert_eq!(config.buckets().pdf, "documents");
        assert!(config.processing().report_skipped_items);
        assert_eq!(
            config.processing().watermark_font_path.as_deref(),
            Some(std::path::Path::new("/fonts/DejaVuSans.ttf"))
        );
    }
}

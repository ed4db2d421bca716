//! FilePick Core Library
//!
//! This crate provides the configuration, error types and shared constants used by
//! every FilePick component.

pub mod config;
pub mod constants;
pub mod error;
pub mod storage_types;

// Re-export commonly used types
pub use config::{AppConfig, BaseConfig, BucketConfig, Config, ProcessingConfig, StorageConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;

//! The blob store boundary: bytes in, public URL out.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Upload timed out after {0} seconds")]
    Timeout(u64),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A blob store that serves what it stores at a public URL.
///
/// Implemented by the Supabase, S3 and local filesystem backends.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload `data` to `path` inside `bucket` and return its public URL.
    ///
    /// `path` is `{folder}/{filename}`; see [`crate::keys`].
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String>;

    /// Public URL an object at `bucket`/`path` is (or would be) served from.
    fn public_url(&self, bucket: &str, path: &str) -> String;

    fn backend_type(&self) -> StorageBackend;
}

use crate::keys::{encode_key, validate_key};
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};

/// Supabase Storage implementation (REST API)
///
/// Objects are written with `POST {url}/storage/v1/object/{bucket}/{path}` and served from
/// `{url}/storage/v1/object/public/{bucket}/{path}`; buckets are expected to be public.
#[derive(Clone)]
pub struct SupabaseStorage {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl SupabaseStorage {
    /// Create a new SupabaseStorage instance
    ///
    /// # Arguments
    /// * `base_url` - Project URL, e.g. "https://abcd.supabase.co"
    /// * `service_key` - Service role key used as bearer token
    pub fn new(base_url: String, service_key: String) -> StorageResult<Self> {
        if service_key.trim().is_empty() {
            return Err(StorageError::ConfigError(
                "Supabase service key is empty".to_string(),
            ));
        }
        // Fail here rather than on the first upload.
        HeaderValue::from_str(&format!("Bearer {}", service_key))
            .map_err(|e| StorageError::ConfigError(format!("Invalid Supabase key: {}", e)))?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
        })
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            encode_key(bucket),
            encode_key(path)
        )
    }
}

#[async_trait]
impl Storage for SupabaseStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        validate_key(bucket)?;
        validate_key(path)?;

        let size = data.len();
        let start = std::time::Instant::now();

        let response = self
            .client
            .post(self.object_url(bucket, path))
            .header(AUTHORIZATION, format!("Bearer {}", self.service_key))
            .header("apikey", &self.service_key)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(data)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    path = %path,
                    size_bytes = size,
                    "Supabase upload request failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                bucket = %bucket,
                path = %path,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                response = %body,
                "Supabase upload rejected"
            );
            return Err(StorageError::UploadFailed(format!(
                "Supabase returned {}: {}",
                status, body
            )));
        }

        tracing::info!(
            bucket = %bucket,
            path = %path,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Supabase upload successful"
        );

        Ok(self.public_url(bucket, path))
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            encode_key(bucket),
            encode_key(path)
        )
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Supabase
    }
}

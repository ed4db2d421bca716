//! In-memory blob store for integration tests.

use async_trait::async_trait;
use bytes::Bytes;
use filepick_storage::{Storage, StorageBackend, StorageError, StorageResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

pub const BASE_URL: &str = "https://blob.test";

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bucket: String,
    pub path: String,
    pub data: Bytes,
    pub content_type: String,
}

#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<Vec<StoredObject>>,
    unavailable: AtomicBool,
}

impl MemoryStorage {
    /// Make every following upload fail
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects.lock().unwrap().clone()
    }

    /// Object behind a public URL returned by the API
    pub fn object_at(&self, url: &str) -> StoredObject {
        self.objects()
            .into_iter()
            .find(|o| self.public_url(&o.bucket, &o.path) == url)
            .unwrap_or_else(|| panic!("no object stored at {}", url))
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed("storage unavailable".to_string()));
        }
        self.objects.lock().unwrap().push(StoredObject {
            bucket: bucket.to_string(),
            path: path.to_string(),
            data,
            content_type: content_type.to_string(),
        });
        Ok(self.public_url(bucket, path))
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{}/{}", BASE_URL, bucket, path)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

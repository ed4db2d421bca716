use crate::batch::{Artifact, OperationFamily};
use filepick_core::BucketConfig;
use filepick_storage::keys::object_path;
use filepick_storage::{Storage, StorageError};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// A persisted artifact
#[derive(Debug, Clone, Serialize)]
pub struct UploadedArtifact {
    pub bucket: String,
    pub folder: String,
    pub filename: String,
    pub url: String,
}

/// Names artifacts and uploads them to the family's bucket.
#[derive(Clone)]
pub struct ArtifactPublisher {
    storage: Arc<dyn Storage>,
    buckets: BucketConfig,
    timeout: Duration,
}

impl ArtifactPublisher {
    pub fn new(storage: Arc<dyn Storage>, buckets: BucketConfig, timeout: Duration) -> Self {
        Self {
            storage,
            buckets,
            timeout,
        }
    }

    pub fn bucket(&self, family: OperationFamily) -> &str {
        match family {
            OperationFamily::Image => &self.buckets.images,
            OperationFamily::Pdf => &self.buckets.pdf,
            OperationFamily::Converted => &self.buckets.converted,
        }
    }

    /// Upload `artifact` under `{folder}/{generated name}` and return its public URL.
    ///
    /// The upload is abandoned with `StorageError::Timeout` once the configured timeout
    /// elapses.
    pub async fn persist(
        &self,
        family: OperationFamily,
        folder: &str,
        artifact: Artifact,
    ) -> Result<UploadedArtifact, StorageError> {
        let bucket = self.bucket(family).to_string();
        let filename = artifact.name.render();
        let path = object_path(folder, &filename);
        let size = artifact.data.len();

        let upload = self
            .storage
            .upload(&bucket, &path, artifact.data, &artifact.content_type);
        let url = tokio::time::timeout(self.timeout, upload)
            .await
            .map_err(|_| StorageError::Timeout(self.timeout.as_secs()))??;

        tracing::info!(
            bucket = %bucket,
            path = %path,
            size,
            content_type = %artifact.content_type,
            "Artifact uploaded"
        );

        Ok(UploadedArtifact {
            bucket,
            folder: folder.to_string(),
            filename,
            url,
        })
    }
}

//! Shared object key helpers for storage backends.
//!
//! Key format: `{folder}/{filename}` inside a logical bucket. Backends that only have a
//! single physical bucket (S3, local) prefix the logical bucket: `{bucket}/{folder}/{filename}`.

use crate::traits::{StorageError, StorageResult};

/// Join a folder and a filename into an object path.
pub fn object_path(folder: &str, filename: &str) -> String {
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        filename.to_string()
    } else {
        format!("{}/{}", folder, filename)
    }
}

/// Reject keys that could escape their namespace.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    if key.split('/').any(|segment| segment.is_empty() || segment == ".." || segment == ".") {
        return Err(StorageError::InvalidKey(format!(
            "Storage key has an invalid segment: {}",
            key
        )));
    }
    Ok(())
}

/// Key used by single-bucket backends for a logical bucket and path.
pub fn bucket_scoped_key(bucket: &str, path: &str) -> StorageResult<String> {
    validate_key(bucket)?;
    validate_key(path)?;
    Ok(format!("{}/{}", bucket, path))
}

/// Percent-encode every segment of a key for use in a URL path.
pub fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_path() {
        assert_eq!(object_path("resized", "a.png"), "resized/a.png");
        assert_eq!(object_path("/split/", "a.pdf"), "split/a.pdf");
        assert_eq!(object_path("", "a.pdf"), "a.pdf");
    }

    #[test]
    fn test_validate_key_rejects_traversal() {
        assert!(validate_key("resized/a.png").is_ok());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("resized/../../a").is_err());
        assert!(validate_key("/abs/path").is_err());
        assert!(validate_key("double//slash").is_err());
        assert!(validate_key("").is_err());
    }

    #[test]
    fn test_bucket_scoped_key() {
        assert_eq!(
            bucket_scoped_key("images", "filtered/x_sepia.jpg").unwrap(),
            "images/filtered/x_sepia.jpg"
        );
        assert!(bucket_scoped_key("images/..", "a.png").is_err());
    }

    #[test]
    fn test_encode_key_keeps_separators() {
        assert_eq!(encode_key("audio/my song_1.mp3"), "audio/my%20song_1.mp3");
    }
}

//! FilePick Storage Library
//!
//! This crate provides the blob store abstraction and its implementations: Supabase
//! Storage (HTTP), S3-compatible object stores and the local filesystem.
//!
//! # Object layout
//!
//! Every object is addressed by a logical bucket (`images`, `pdf-files`,
//! `converted-files`) and a path of the form `{folder}/{filename}`. Supabase maps the
//! logical bucket to a real bucket; S3 and local storage use it as the first key
//! segment inside the single configured bucket/directory.
//!
//! Paths must not contain `..`, a leading `/` or empty segments. Validation is
//! centralized in the `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
#[cfg(feature = "storage-supabase")]
pub mod supabase;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use filepick_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
#[cfg(feature = "storage-supabase")]
pub use supabase::SupabaseStorage;
pub use traits::{Storage, StorageError, StorageResult};

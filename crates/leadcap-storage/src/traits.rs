//! Object storage abstraction
//!
//! This module defines the `ObjectStorage` trait the upload broker talks to. Pictures never
//! pass through the application server: the broker hands out presigned POST grants and
//! later inspects what landed in the bucket with a metadata-only HEAD.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Presigning failed: {0}")]
    PresignFailed(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Constraints baked into a presigned POST policy. Storage enforces every one of them at
/// upload time, so a client cannot change them after the grant is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostPolicy {
    pub key: String,
    pub content_type: String,
    /// Inclusive upper bound for `content-length-range` (lower bound is 1 byte)
    pub max_bytes: u64,
    pub server_side_encryption: String,
    /// User metadata pinned with exact-match conditions, keys without the `x-amz-meta-` prefix
    pub metadata: BTreeMap<String, String>,
    pub expires_in: Duration,
}

/// URL plus form fields for a browser-style multipart POST. The file part goes last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedPost {
    pub url: String,
    pub fields: BTreeMap<String, String>,
}

/// What a HEAD request reports about a stored object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectHead {
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub server_side_encryption: Option<String>,
    /// User metadata with lowercased keys and no `x-amz-meta-` prefix
    pub metadata: HashMap<String, String>,
}

/// Object storage abstraction trait
///
/// Implemented by `S3Storage` in production and by in-memory fakes in tests.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Issue a presigned POST grant enforcing `policy`.
    async fn presigned_post(&self, policy: &PostPolicy) -> StorageResult<PresignedPost>;

    /// Generate a presigned GET URL for temporary read access.
    async fn presigned_get(&self, storage_key: &str, expires_in: Duration) -> StorageResult<String>;

    /// Fetch object metadata without the body. Missing objects yield `StorageError::NotFound`.
    async fn head(&self, storage_key: &str) -> StorageResult<ObjectHead>;
}

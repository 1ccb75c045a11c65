#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{ObjectStorage, StorageResult};
use leadcap_core::Config;
use std::sync::Arc;

/// Create the object storage backend from configuration
pub fn create_storage(config: &Config) -> StorageResult<Arc<dyn ObjectStorage>> {
    #[cfg(feature = "storage-s3")]
    {
        let storage = S3Storage::new(config.storage())?;
        Ok(Arc::new(storage))
    }

    #[cfg(not(feature = "storage-s3"))]
    {
        let _ = config;
        Err(crate::StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        ))
    }
}

//! Storage setup and initialization

use anyhow::{Context, Result};
use leadcap_core::Config;
use leadcap_storage::{create_storage, ObjectStorage};
use std::sync::Arc;

pub fn setup_storage(config: &Config) -> Result<Arc<dyn ObjectStorage>> {
    tracing::info!("Initializing object storage...");
    let storage = create_storage(config).context("Failed to initialize object storage")?;
    tracing::info!(
        bucket = %config.storage().bucket,
        region = %config.storage().region,
        custom_endpoint = config.storage().endpoint.is_some(),
        "Object storage initialized"
    );
    Ok(storage)
}

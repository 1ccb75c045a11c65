//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from main.rs
//! for better organization and testability.

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;
pub mod validation;

use crate::auth::PictureTokenService;
use crate::services::{CrmForwarder, LeadService, LoggingCrm, UploadBroker, UploadPolicy};
use crate::state::AppState;
use anyhow::{Context, Result};
use leadcap_core::Config;
use leadcap_db::{LeadRepository, PgLeadRepository};
use leadcap_storage::ObjectStorage;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    validation::validate_config(&config).context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.is_production())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let pool = database::setup_database(&config).await?;
    let storage = storage::setup_storage(&config)?;

    let state = build_state(
        &config,
        Arc::new(PgLeadRepository::new(pool)),
        storage,
        Arc::new(LoggingCrm),
    );

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}

/// Wire the services together from their collaborators.
pub fn build_state(
    config: &Config,
    repository: Arc<dyn LeadRepository>,
    storage: Arc<dyn ObjectStorage>,
    crm: Arc<dyn CrmForwarder>,
) -> Arc<AppState> {
    let tokens = Arc::new(PictureTokenService::new(
        config.picture_token_secret(),
        config.picture_token_ttl_secs(),
    ));
    let broker = UploadBroker::new(storage, UploadPolicy::from_config(config));
    let leads = LeadService::new(repository, broker, crm, tokens.clone());

    Arc::new(AppState { tokens, leads })
}

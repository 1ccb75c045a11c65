//! Lead database pool and schema

use anyhow::{Context, Result};
use leadcap_core::Config;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Lead schema, embedded at build time from the workspace `migrations/` directory.
static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Connect to Postgres and bring the `leads` table up to date.
pub async fn setup_database(config: &Config) -> Result<PgPool> {
    tracing::info!(
        max_connections = config.db_max_connections(),
        "Connecting to lead database"
    );
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections())
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
        .connect(config.database_url())
        .await
        .context("Failed to connect to lead database")?;

    MIGRATOR
        .run(&pool)
        .await
        .context("Failed to apply lead schema migrations")?;

    let leads: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leads")
        .fetch_one(&pool)
        .await
        .context("Lead table is not readable after migrations")?;

    tracing::info!(
        schema_version = MIGRATOR.iter().map(|m| m.version).max().unwrap_or_default(),
        leads,
        "Lead database ready"
    );

    Ok(pool)
}

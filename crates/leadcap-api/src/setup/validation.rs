//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use leadcap_core::Config;

/// Validate critical configuration values
///
/// Field-level rules live in `Config::validate`; this adds the checks that only matter
/// for a running server.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let is_production = config.is_production();

    if is_production && config.cors_origins().iter().any(|o| o == "*") {
        return Err(anyhow::anyhow!(
            "CORS configured to allow all origins (*) in production. \
            Set specific allowed origins via CORS_ORIGINS."
        ));
    }

    if config.db_max_connections() == 0 {
        return Err(anyhow::anyhow!("Database max connections cannot be 0"));
    }

    if config.db_timeout_seconds() == 0 {
        return Err(anyhow::anyhow!("Database timeout cannot be 0"));
    }

    if config.storage().endpoint.is_some() && is_production {
        tracing::warn!(
            endpoint = ?config.storage().endpoint,
            "Custom S3 endpoint configured in production"
        );
    }

    if config.picture_token_ttl_secs() > 24 * 3600 {
        tracing::warn!(
            ttl_secs = config.picture_token_ttl_secs(),
            "Picture token TTL is longer than a day"
        );
    }

    Ok(())
}

//! Configuration module
//!
//! This module provides the configuration structures for the lead capture server:
//! HTTP and database settings, picture token settings, and object storage access.
//! Everything is read from the environment (optionally seeded from a `.env` file).

use std::env;

use crate::constants::{DEFAULT_MAX_IMAGE_BYTES, DEFAULT_SERVER_SIDE_ENCRYPTION, DEFAULT_TTL_SECS};
use crate::validation::picture::DEFAULT_ALLOWED_IMAGE_TYPES;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const REQUEST_TIMEOUT_SECS: u64 = 30;
const MIN_SECRET_LENGTH: usize = 32;

/// Base configuration shared by every server process
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub request_timeout_secs: u64,
    pub environment: String,
}

/// Object storage settings. Static credentials are required because presigned POST
/// policies are signed locally.
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible providers (MinIO, etc.); switches to path-style URLs.
    pub endpoint: Option<String>,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    pub server_side_encryption: String,
    pub presigned_url_ttl_secs: u64,
}

/// Lead service configuration
#[derive(Clone, Debug)]
pub struct LeadServiceConfig {
    pub base: BaseConfig,
    pub database_url: String,
    pub picture_token_secret: String,
    pub picture_token_ttl_secs: u64,
    pub max_image_bytes: u64,
    pub allowed_image_types: Vec<String>,
    pub storage: StorageConfig,
}

/// Application configuration (lead service).
#[derive(Clone, Debug)]
pub struct Config(pub Box<LeadServiceConfig>);

impl Config {
    fn as_service(&self) -> &LeadServiceConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.as_service().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = LeadServiceConfig::from_lookup(|key| env::var(key).ok())?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_service().validate()
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.as_service().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_service().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_service().base.environment
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.as_service().base.request_timeout_secs
    }

    pub fn database_url(&self) -> &str {
        &self.as_service().database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_service().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_service().base.db_timeout_seconds
    }

    pub fn picture_token_secret(&self) -> &str {
        &self.as_service().picture_token_secret
    }

    pub fn picture_token_ttl_secs(&self) -> u64 {
        self.as_service().picture_token_ttl_secs
    }

    pub fn max_image_bytes(&self) -> u64 {
        self.as_service().max_image_bytes
    }

    pub fn allowed_image_types(&self) -> &[String] {
        &self.as_service().allowed_image_types
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.as_service().storage
    }

    /// Multipart bodies never reach this server, so the body limit only has to cover JSON.
    pub fn max_body_bytes(&self) -> usize {
        64 * 1024
    }
}

fn is_production_env(environment: &str) -> bool {
    let environment = environment.to_lowercase();
    environment == "production" || environment == "prod"
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl LeadServiceConfig {
    /// Build the configuration from a key lookup. `Config::from_env` passes the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = lookup("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        if is_production_env(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: lookup("PORT")
                .unwrap_or_else(|| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: parse_or(lookup("DB_MAX_CONNECTIONS"), MAX_CONNECTIONS),
            db_timeout_seconds: parse_or(lookup("DB_TIMEOUT_SECONDS"), CONNECTION_TIMEOUT_SECS),
            request_timeout_secs: parse_or(lookup("REQUEST_TIMEOUT_SECS"), REQUEST_TIMEOUT_SECS),
            environment,
        };

        let allowed_image_types = lookup("ALLOWED_IMAGE_TYPES")
            .map(|v| split_list(&v))
            .unwrap_or_else(|| {
                DEFAULT_ALLOWED_IMAGE_TYPES
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            });

        let storage = StorageConfig {
            bucket: lookup("S3_BUCKET").unwrap_or_default(),
            region: lookup("S3_REGION")
                .or_else(|| lookup("AWS_REGION"))
                .unwrap_or_default(),
            endpoint: lookup("S3_ENDPOINT").filter(|s| !s.trim().is_empty()),
            access_key_id: lookup("AWS_ACCESS_KEY_ID").unwrap_or_default(),
            secret_access_key: lookup("AWS_SECRET_ACCESS_KEY").unwrap_or_default(),
            session_token: lookup("AWS_SESSION_TOKEN").filter(|s| !s.trim().is_empty()),
            server_side_encryption: lookup("S3_SERVER_SIDE_ENCRYPTION")
                .unwrap_or_else(|| DEFAULT_SERVER_SIDE_ENCRYPTION.to_string()),
            presigned_url_ttl_secs: parse_or(lookup("PRESIGNED_URL_TTL_SECS"), DEFAULT_TTL_SECS),
        };

        Ok(LeadServiceConfig {
            base,
            database_url: lookup("DATABASE_URL").unwrap_or_default(),
            picture_token_secret: lookup("PICTURE_TOKEN_SECRET").unwrap_or_default(),
            picture_token_ttl_secs: parse_or(lookup("PICTURE_TOKEN_TTL_SECS"), DEFAULT_TTL_SECS),
            max_image_bytes: parse_or(lookup("MAX_IMAGE_BYTES"), DEFAULT_MAX_IMAGE_BYTES),
            allowed_image_types,
            storage,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.picture_token_secret.len() < MIN_SECRET_LENGTH {
            return Err(anyhow::anyhow!(
                "PICTURE_TOKEN_SECRET must be at least {} characters long",
                MIN_SECRET_LENGTH
            ));
        }

        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.picture_token_ttl_secs == 0 || self.storage.presigned_url_ttl_secs == 0 {
            return Err(anyhow::anyhow!(
                "PICTURE_TOKEN_TTL_SECS and PRESIGNED_URL_TTL_SECS must be greater than zero"
            ));
        }

        // SigV4 presigned URLs cannot outlive seven days
        if self.storage.presigned_url_ttl_secs > 7 * 24 * 3600 {
            return Err(anyhow::anyhow!(
                "PRESIGNED_URL_TTL_SECS must not exceed 604800 (7 days)"
            ));
        }

        if self.max_image_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_IMAGE_BYTES must be greater than zero"));
        }

        if self.allowed_image_types.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_IMAGE_TYPES must not be empty"));
        }

        if self.storage.bucket.is_empty() {
            return Err(anyhow::anyhow!("S3_BUCKET must be set"));
        }
        if self.storage.region.is_empty() {
            return Err(anyhow::anyhow!("S3_REGION or AWS_REGION must be set"));
        }
        if self.storage.access_key_id.is_empty() || self.storage.secret_access_key.is_empty() {
            return Err(anyhow::anyhow!(
                "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set to sign upload policies"
            ));
        }

        Ok(())
    }
}

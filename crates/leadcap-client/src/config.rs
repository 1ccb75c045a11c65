//! Client configuration from the environment.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use leadcap_core::constants::DEFAULT_MAX_IMAGE_BYTES;

const DEFAULT_API_URL: &str = "http://localhost:4000";
const DEFAULT_DRAFT_DB: &str = "leadcap-draft.db";
const DEFAULT_PROBE_INTERVAL_SECS: u64 = 15;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub draft_db_path: PathBuf,
    /// Upper bound on the summed bytes of all images held in the draft
    pub draft_quota_bytes: u64,
    pub probe_interval: Duration,
    pub http_timeout: Duration,
}

impl ClientConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("LEADCAP_API_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let draft_quota_bytes = parse(&lookup, "LEADCAP_DRAFT_QUOTA_BYTES", DEFAULT_MAX_IMAGE_BYTES)?;
        if draft_quota_bytes == 0 {
            anyhow::bail!("LEADCAP_DRAFT_QUOTA_BYTES must be greater than 0");
        }

        let probe_interval_secs =
            parse(&lookup, "LEADCAP_PROBE_INTERVAL_SECS", DEFAULT_PROBE_INTERVAL_SECS)?;
        let http_timeout_secs =
            parse(&lookup, "LEADCAP_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            draft_db_path: lookup("LEADCAP_DRAFT_DB")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DRAFT_DB)),
            draft_quota_bytes,
            probe_interval: Duration::from_secs(probe_interval_secs.max(1)),
            http_timeout: Duration::from_secs(http_timeout_secs.max(1)),
        })
    }
}

fn parse<F>(lookup: &F, key: &str, default: u64) -> anyhow::Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} must be a non-negative integer", key)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.api_url, "http://localhost:4000");
        assert_eq!(config.draft_db_path, PathBuf::from("leadcap-draft.db"));
        assert_eq!(config.draft_quota_bytes, 20 * 1024 * 1024);
        assert_eq!(config.probe_interval, Duration::from_secs(15));
    }

    #[test]
    fn test_overrides_and_trailing_slash() {
        let config = ClientConfig::from_lookup(|key| match key {
            "LEADCAP_API_URL" => Some("https://leads.example.de/".to_string()),
            "LEADCAP_DRAFT_QUOTA_BYTES" => Some("1024".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.api_url, "https://leads.example.de");
        assert_eq!(config.draft_quota_bytes, 1024);
    }

    #[test]
    fn test_garbage_quota_rejected() {
        let result = ClientConfig::from_lookup(|key| {
            (key == "LEADCAP_DRAFT_QUOTA_BYTES").then(|| "lots".to_string())
        });
        assert!(result.is_err());
    }
}

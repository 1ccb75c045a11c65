//! Shared key generation for lead pictures.
//!
//! Key format: `leads/{lead_id}/{unix_millis}-{uuid_v4}-{sanitized_file_name}`. The random
//! component keeps concurrent uploads of identically named files apart.

use leadcap_core::constants::LEAD_KEY_PREFIX;
use leadcap_core::validation::sanitize_file_name;
use uuid::Uuid;

/// Prefix every picture of `lead_id` lives under, including the trailing slash.
pub fn lead_prefix(lead_id: Uuid) -> String {
    format!("{}/{}/", LEAD_KEY_PREFIX, lead_id)
}

/// Build a key from explicit parts.
pub fn picture_key(lead_id: Uuid, unix_millis: i64, nonce: Uuid, file_name: &str) -> String {
    format!(
        "{}{}-{}-{}",
        lead_prefix(lead_id),
        unix_millis,
        nonce,
        sanitize_file_name(file_name)
    )
}

/// Generate a fresh key for an upload happening now.
pub fn generate_picture_key(lead_id: Uuid, file_name: &str) -> String {
    picture_key(
        lead_id,
        chrono::Utc::now().timestamp_millis(),
        Uuid::new_v4(),
        file_name,
    )
}

/// True when `key` is a single object directly under the lead's prefix.
pub fn belongs_to_lead(key: &str, lead_id: Uuid) -> bool {
    match key.strip_prefix(&lead_prefix(lead_id)) {
        Some(rest) => !rest.is_empty() && !rest.contains('/') && !rest.contains(".."),
        None => false,
    }
}

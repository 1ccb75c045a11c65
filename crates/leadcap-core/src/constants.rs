//! Shared constants for the picture upload protocol.

/// Scope claim carried by picture access tokens.
pub const PICTURE_SCOPE: &str = "picture";

/// Default per-image limit, also the default offline draft quota (20 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 20 * 1024 * 1024;

/// Default lifetime of picture tokens and presigned URLs.
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Sanitized file names are cut down to their last `MAX_FILE_NAME_LENGTH` characters.
pub const MAX_FILE_NAME_LENGTH: usize = 100;

/// Longest first or last name `POST /leads` accepts, in characters.
pub const MAX_NAME_LENGTH: usize = 100;

/// Longest phone number `POST /leads` accepts, in characters.
pub const MAX_PHONE_LENGTH: usize = 50;

/// Server-side encryption algorithm required on every stored picture.
pub const DEFAULT_SERVER_SIDE_ENCRYPTION: &str = "AES256";

/// User metadata key carrying the owning lead id (S3 lowercases metadata keys).
pub const META_LEAD_ID_KEY: &str = "lead-id";

/// Object key prefix for all lead pictures.
pub const LEAD_KEY_PREFIX: &str = "leads";

/// Logical key of the single offline draft slot.
pub const DRAFT_SLOT: &str = "current";

//! Leadcap Storage Library
//!
//! This crate provides the object storage abstraction used by the picture upload broker
//! and its S3 implementation.
//!
//! # Storage key format
//!
//! Every picture key lives under its lead: `leads/{lead_id}/{unix_millis}-{uuid}-{name}`.
//! Key generation is centralized in the `keys` module so presign and attach agree on it.

pub mod factory;
pub mod keys;
pub mod post_policy;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use post_policy::{PostPolicySigner, SigningCredentials};
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ObjectHead, ObjectStorage, PostPolicy, PresignedPost, StorageError, StorageResult};

//! Leadcap Core Library
//!
//! This crate provides the domain models, error types, configuration, and validation
//! rules shared by the lead capture server and the offline-capable client.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{BaseConfig, Config, LeadServiceConfig, StorageConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};

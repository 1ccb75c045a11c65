//! Leadcap API Library
//!
//! This crate provides the HTTP API: lead creation, the picture token guard, and the
//! presign/verify upload broker, plus application setup.

mod api_doc;
mod handlers;
mod middleware;
mod telemetry;

pub mod auth;
pub mod error;
pub mod services;
pub mod setup;
pub mod state;

pub use api_doc::ApiDoc;
pub use error::ErrorResponse;
pub use state::AppState;

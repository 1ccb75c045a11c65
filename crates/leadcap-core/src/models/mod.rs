//! Data models for the application
//!
//! Leads and their request/response bodies live in `lead`; the picture upload
//! handshake (presign, attach) lives in `picture`.

mod lead;
mod picture;

// Re-export all models for convenient imports
pub use lead::*;
pub use picture::*;

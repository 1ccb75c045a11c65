//! Leadcap Database Library
//!
//! Persistence for lead records. The server only ever creates leads and appends verified
//! picture metadata to them; nothing in this crate deletes a lead.

pub mod db;

pub use db::{LeadRepository, PgLeadRepository};

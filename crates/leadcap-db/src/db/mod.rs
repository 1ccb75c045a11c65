//! Database repositories for data access layer
//
// Lead records and their picture lists
pub mod leads;

pub use leads::{LeadRepository, PgLeadRepository};

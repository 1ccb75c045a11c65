//! Application state shared by all handlers.

use crate::auth::PictureTokenService;
use crate::services::leads::LeadService;
use std::sync::Arc;

/// Main application state. Every field is cheap to clone and safe to share across requests.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<PictureTokenService>,
    pub leads: LeadService,
}

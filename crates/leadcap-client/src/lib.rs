//! Offline-capable lead capture client.
//!
//! The client keeps the lead form and its pictures in a single local draft (SQLite) until the
//! server has confirmed every picture. The orchestrator creates the remote lead at most once per
//! draft and resumes queued uploads whenever connectivity returns. The `leadcap` binary drives
//! the same orchestrator from the command line.

pub mod api;
pub mod config;
pub mod draft;
pub mod error;
pub mod network;
pub mod orchestrator;

pub use api::{HttpLeadApi, LeadApi};
pub use config::ClientConfig;
pub use draft::{DraftRepository, ImageRecord, LeadDraft, NewImage, SqliteDraftRepository};
pub use error::{ApiError, ApiErrorKind, ClientError, DraftStoreError};
pub use network::NetworkMonitor;
pub use orchestrator::{
    primary_action_enabled, primary_action_label, status_message, FlowSnapshot, FlowState,
    Orchestrator, SubmitOutcome, SyncOutcome,
};

/// Initialize tracing for the CLI.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

//! Client error types
//!
//! `DraftStoreError` covers the local draft store, `ApiError` everything that crosses the
//! network, and `ClientError` is what the orchestrator surfaces. Each `ClientError` maps to a
//! short German message for the person in front of the device.

use leadcap_core::validation::FieldErrors;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DraftStoreError {
    #[error("Draft quota exceeded: {attempted} bytes requested, {quota} bytes allowed")]
    QuotaExceeded { attempted: u64, quota: u64 },

    #[error("No draft found")]
    NoDraftFound,

    #[error("Draft storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Draft migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Stored draft is corrupt: {0}")]
    Corrupt(String),
}

impl From<serde_json::Error> for DraftStoreError {
    fn from(err: serde_json::Error) -> Self {
        DraftStoreError::Corrupt(err.to_string())
    }
}

/// What kind of failure the server (or the network) reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Missing, expired or foreign picture token
    Auth,
    UnsupportedType,
    TypeMismatch,
    /// The stored object did not pass the server's re-check
    VerificationFailed,
    NotFound,
    /// Any other 4xx the server rejected outright
    Rejected,
    /// Storage, CRM, database or network failure; worth retrying
    Transient,
}

impl ApiErrorKind {
    /// Classify a server error from its machine-readable code, falling back to the status.
    pub fn from_response(status: u16, code: Option<&str>) -> Self {
        match code {
            Some("UNAUTHORIZED") => ApiErrorKind::Auth,
            Some("UNSUPPORTED_TYPE") => ApiErrorKind::UnsupportedType,
            Some("TYPE_MISMATCH") => ApiErrorKind::TypeMismatch,
            Some("VERIFICATION_FAILED") => ApiErrorKind::VerificationFailed,
            Some("NOT_FOUND") => ApiErrorKind::NotFound,
            _ => match status {
                401 | 403 => ApiErrorKind::Auth,
                404 => ApiErrorKind::NotFound,
                408 | 429 => ApiErrorKind::Transient,
                400..=499 => ApiErrorKind::Rejected,
                _ => ApiErrorKind::Transient,
            },
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiErrorKind::Transient)
    }
}

#[derive(Debug, Error)]
#[error("{kind:?}: {message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// HTTP status, `None` when the request never got an answer
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Transient, None, message)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ApiError::new(
                ApiErrorKind::from_response(status.as_u16(), None),
                Some(status.as_u16()),
                err.to_string(),
            ),
            None => ApiError::transient(err.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Lead form is invalid")]
    Validation(FieldErrors),

    #[error(transparent)]
    Draft(#[from] DraftStoreError),

    #[error("Another submission or upload is already running")]
    Busy,

    #[error("Lead submission failed: {0}")]
    Submit(#[source] ApiError),

    #[error("Picture upload failed for {file_name}: {source}")]
    Upload {
        file_name: String,
        #[source]
        source: ApiError,
    },

    #[error("Resumed picture upload failed: {0}")]
    ResumeUpload(#[source] ApiError),

    /// The server no longer accepts the picture token stored with the draft. Retrying
    /// cannot help; the queued pictures can only be discarded.
    #[error("Picture token was rejected: {0}")]
    PictureTokenRejected(#[source] ApiError),
}

impl ClientError {
    /// Short localized message shown to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            ClientError::Validation(_) => "Bitte überprüfen Sie Ihre Eingaben.",
            ClientError::Draft(DraftStoreError::QuotaExceeded { .. }) => {
                "Offline-Speicher voll. Bitte weniger oder kleinere Bilder auswählen."
            }
            ClientError::Draft(DraftStoreError::NoDraftFound) => {
                "Keine Offline-Anfrage gefunden. Bitte Formular erneut senden."
            }
            ClientError::Draft(_) => "Offline speichern fehlgeschlagen.",
            ClientError::Busy => "Bitte warten, der Vorgang läuft bereits.",
            ClientError::Submit(_) => "Senden fehlgeschlagen.",
            ClientError::Upload { .. } => "Bild-Upload fehlgeschlagen.",
            ClientError::ResumeUpload(_) => "Offline-Bilder konnten nicht hochgeladen werden.",
            ClientError::PictureTokenRejected(_) => {
                "Upload-Berechtigung abgelaufen. Die Offline-Bilder können nicht mehr automatisch hochgeladen werden."
            }
        }
    }

    /// Network-side cause, when there is one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            ClientError::Submit(e)
            | ClientError::ResumeUpload(e)
            | ClientError::PictureTokenRejected(e) => Some(e),
            ClientError::Upload { source, .. } => Some(source),
            _ => None,
        }
    }
}

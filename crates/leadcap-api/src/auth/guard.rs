//! Picture access guard
//!
//! Route-layer middleware for `/leads/{id}/pictures/*`. A request passes only with a bearer
//! picture token whose `leadId` equals the `{id}` path segment; the verified lead id is then
//! inserted into the request extensions as `PictureAccess`.

use crate::auth::token::invalid_token;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{FromRequestParts, Path, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use leadcap_core::AppError;
use std::sync::Arc;
use uuid::Uuid;

/// Lead the current request is authorized for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PictureAccess {
    pub lead_id: Uuid,
}

pub fn bearer_token(value: Option<&str>) -> Option<&str> {
    let token = value?.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

pub async fn picture_guard(
    State(state): State<Arc<AppState>>,
    Path(path_lead_id): Path<String>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match bearer_token(header) {
        Some(token) => token,
        None => {
            tracing::debug!(path_lead_id = %path_lead_id, "Picture request without bearer token");
            return HttpAppError(AppError::Unauthorized("Missing bearer token".to_string()))
                .into_response();
        }
    };

    let claims = match state.tokens.verify(token) {
        Ok(claims) => claims,
        Err(err) => return HttpAppError(err).into_response(),
    };

    if claims.lead_id.to_string() != path_lead_id {
        tracing::warn!(
            token_lead_id = %claims.lead_id,
            path_lead_id = %path_lead_id,
            "Picture token used against another lead"
        );
        return HttpAppError(invalid_token()).into_response();
    }

    request.extensions_mut().insert(PictureAccess {
        lead_id: claims.lead_id,
    });

    next.run(request).await
}

impl<S> FromRequestParts<S> for PictureAccess
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<PictureAccess>()
            .copied()
            .ok_or_else(|| HttpAppError(AppError::Unauthorized("Missing bearer token".to_string())))
    }
}

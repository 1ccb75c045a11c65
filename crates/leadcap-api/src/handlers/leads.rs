use crate::auth::PictureAccess;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use leadcap_core::models::{
    AttachPictureRequest, AttachPictureResponse, CreateLeadRequest, CreateLeadResponse,
    PictureMeta, PresignPictureRequest, PresignPictureResponse,
};
use std::sync::Arc;
use uuid::Uuid;

/// Create a lead and receive its picture token
#[utoipa::path(
    post,
    path = "/leads",
    tag = "leads",
    request_body = CreateLeadRequest,
    responses(
        (status = 201, description = "Lead created", body = CreateLeadResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "create_lead"))]
pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CreateLeadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let response = state.leads.create(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get a presigned POST grant for one picture of the lead
#[utoipa::path(
    post,
    path = "/leads/{id}/pictures/presign",
    tag = "pictures",
    params(
        ("id" = Uuid, Path, description = "Lead ID")
    ),
    request_body = PresignPictureRequest,
    responses(
        (status = 200, description = "Upload grant issued", body = PresignPictureResponse),
        (status = 400, description = "Unsupported type or extension mismatch", body = ErrorResponse),
        (status = 401, description = "Missing, invalid or foreign picture token", body = ErrorResponse),
        (status = 502, description = "Storage unavailable", body = ErrorResponse)
    ),
    security(("picture_token" = []))
)]
#[tracing::instrument(
    skip(state, request),
    fields(lead_id = %access.lead_id, operation = "presign_picture")
)]
pub async fn presign_picture(
    access: PictureAccess,
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<PresignPictureRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let grant = state
        .leads
        .presign_picture(access.lead_id, &request.file_name, &request.content_type)
        .await?;
    Ok(Json(grant))
}

/// Attach an uploaded picture after re-verifying the stored object
#[utoipa::path(
    post,
    path = "/leads/{id}/pictures",
    tag = "pictures",
    params(
        ("id" = Uuid, Path, description = "Lead ID")
    ),
    request_body = AttachPictureRequest,
    responses(
        (status = 200, description = "Picture attached", body = AttachPictureResponse),
        (status = 400, description = "Stored object failed verification", body = ErrorResponse),
        (status = 401, description = "Missing, invalid or foreign picture token", body = ErrorResponse),
        (status = 404, description = "Lead not found", body = ErrorResponse),
        (status = 502, description = "Storage unavailable", body = ErrorResponse)
    ),
    security(("picture_token" = []))
)]
#[tracing::instrument(
    skip(state, request),
    fields(lead_id = %access.lead_id, key = %request.key, operation = "attach_picture")
)]
pub async fn attach_picture(
    access: PictureAccess,
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<AttachPictureRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .leads
        .attach_picture(access.lead_id, PictureMeta::from(request))
        .await?;
    Ok(Json(AttachPictureResponse {
        success: true,
        message: "Picture attached".to_string(),
    }))
}

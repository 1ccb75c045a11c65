use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Metadata of one verified picture, appended to a lead on attach
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PictureMeta {
    pub key: String,
    pub mime_type: String,
    pub original_name: String,
}

/// Request body of `POST /leads/{id}/pictures/presign`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PresignPictureRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "File name must be between 1 and 255 characters"
    ))]
    pub file_name: String,
    #[validate(length(
        min = 1,
        max = 255,
        message = "Content type must be between 1 and 255 characters"
    ))]
    pub content_type: String,
}

/// Presigned POST grant: the client posts `fields` plus the file (last) to `url`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresignPictureResponse {
    pub url: String,
    /// Form fields in the order they must be sent
    pub fields: BTreeMap<String, String>,
    /// Short-lived read URL for the object
    pub access_url: String,
    pub key: String,
}

/// Request body of `POST /leads/{id}/pictures`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AttachPictureRequest {
    #[validate(length(min = 1, max = 1024, message = "Key is required"))]
    pub key: String,
    #[validate(length(min = 1, max = 255, message = "MIME type is required"))]
    pub mime_type: String,
    #[validate(length(min = 1, max = 255, message = "Original name is required"))]
    pub original_name: String,
}

impl From<AttachPictureRequest> for PictureMeta {
    fn from(req: AttachPictureRequest) -> Self {
        PictureMeta {
            key: req.key,
            mime_type: req.mime_type,
            original_name: req.original_name,
        }
    }
}

/// Response of `POST /leads/{id}/pictures`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttachPictureResponse {
    pub success: bool,
    pub message: String,
}

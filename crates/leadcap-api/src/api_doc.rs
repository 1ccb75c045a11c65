//! OpenAPI documentation.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use leadcap_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leadcap API",
        version = "0.1.0",
        description = "Lead capture with direct-to-storage picture uploads. A lead is created once; \
            its picture token then authorizes presigning and attaching pictures for that lead only."
    ),
    paths(
        handlers::health::health_check,
        handlers::leads::create_lead,
        handlers::leads::presign_picture,
        handlers::leads::attach_picture,
    ),
    components(schemas(
        models::Salutation,
        models::CreateLeadRequest,
        models::CreateLeadResponse,
        models::PresignPictureRequest,
        models::PresignPictureResponse,
        models::AttachPictureRequest,
        models::AttachPictureResponse,
        models::PictureMeta,
        handlers::health::HealthResponse,
        error::ErrorResponse,
    )),
    modifiers(&PictureTokenAddon),
    tags(
        (name = "leads", description = "Lead creation"),
        (name = "pictures", description = "Picture presign and attach, bearer picture token required"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

struct PictureTokenAddon;

impl Modify for PictureTokenAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "picture_token",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

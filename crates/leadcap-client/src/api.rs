//! Lead API client
//!
//! `LeadApi` is the seam between the orchestrator and the network. `HttpLeadApi` talks to the
//! lead server with `reqwest` and posts picture bytes straight to object storage using the
//! presigned grant.

use std::time::Duration;

use async_trait::async_trait;
use leadcap_core::models::{
    AttachPictureRequest, AttachPictureResponse, CreateLeadRequest, CreateLeadResponse,
    PresignPictureRequest, PresignPictureResponse,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::draft::ImageRecord;
use crate::error::{ApiError, ApiErrorKind};

#[async_trait]
pub trait LeadApi: Send + Sync {
    async fn create_lead(&self, form: &CreateLeadRequest) -> Result<CreateLeadResponse, ApiError>;

    async fn presign(
        &self,
        lead_id: Uuid,
        picture_token: &str,
        request: &PresignPictureRequest,
    ) -> Result<PresignPictureResponse, ApiError>;

    /// Post the grant's fields and then the file itself to the storage URL.
    async fn upload(
        &self,
        grant: &PresignPictureResponse,
        image: &ImageRecord,
    ) -> Result<(), ApiError>;

    async fn attach(
        &self,
        lead_id: Uuid,
        picture_token: &str,
        request: &AttachPictureRequest,
    ) -> Result<(), ApiError>;

    /// Presign, upload and attach one picture. Returns the storage key once the server has
    /// verified the object and recorded it on the lead.
    async fn upload_picture(
        &self,
        lead_id: Uuid,
        picture_token: &str,
        image: &ImageRecord,
    ) -> Result<String, ApiError> {
        let grant = self
            .presign(
                lead_id,
                picture_token,
                &PresignPictureRequest {
                    file_name: image.file_name.clone(),
                    content_type: image.mime_type.clone(),
                },
            )
            .await?;

        self.upload(&grant, image).await?;

        self.attach(
            lead_id,
            picture_token,
            &AttachPictureRequest {
                key: grant.key.clone(),
                mime_type: image.mime_type.clone(),
                original_name: image.file_name.clone(),
            },
        )
        .await?;

        Ok(grant.key)
    }
}

/// Error body rendered by the lead server
#[derive(Debug, Deserialize)]
struct ServerError {
    error: String,
    code: Option<String>,
}

#[derive(Clone, Debug)]
pub struct HttpLeadApi {
    client: Client,
    base_url: String,
}

impl HttpLeadApi {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> anyhow::Result<Self> {
        Self::new(&config.api_url, config.http_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Raw client, shared with the reachability probe.
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST JSON body and deserialize response. Any 2xx counts as success.
    async fn post_json<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        picture_token: Option<&str>,
    ) -> Result<T, ApiError> {
        let mut request = self.client.post(self.build_url(path)).json(body);
        if let Some(token) = picture_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(server_error(status.as_u16(), &error_text));
        }

        response.json::<T>().await.map_err(|e| {
            ApiError::new(
                ApiErrorKind::Rejected,
                Some(status.as_u16()),
                format!("Failed to parse response as JSON: {}", e),
            )
        })
    }
}

fn server_error(status: u16, body: &str) -> ApiError {
    match serde_json::from_str::<ServerError>(body) {
        Ok(parsed) => ApiError::new(
            ApiErrorKind::from_response(status, parsed.code.as_deref()),
            Some(status),
            parsed.error,
        ),
        Err(_) => ApiError::new(
            ApiErrorKind::from_response(status, None),
            Some(status),
            format!("API request failed with status {}: {}", status, body),
        ),
    }
}

#[async_trait]
impl LeadApi for HttpLeadApi {
    async fn create_lead(&self, form: &CreateLeadRequest) -> Result<CreateLeadResponse, ApiError> {
        self.post_json("/leads", form, None).await
    }

    async fn presign(
        &self,
        lead_id: Uuid,
        picture_token: &str,
        request: &PresignPictureRequest,
    ) -> Result<PresignPictureResponse, ApiError> {
        self.post_json(
            &format!("/leads/{}/pictures/presign", lead_id),
            request,
            Some(picture_token),
        )
        .await
    }

    async fn upload(
        &self,
        grant: &PresignPictureResponse,
        image: &ImageRecord,
    ) -> Result<(), ApiError> {
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in &grant.fields {
            form = form.text(name.clone(), value.clone());
        }
        // Storage ignores every field after the file, so it goes last
        let part = reqwest::multipart::Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime_type)?;
        form = form.part("file", part);

        let response = self.client.post(&grant.url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let kind = if status.is_server_error() {
                ApiErrorKind::Transient
            } else {
                ApiErrorKind::Rejected
            };
            return Err(ApiError::new(
                kind,
                Some(status.as_u16()),
                format!("Storage rejected upload with status {}: {}", status, error_text),
            ));
        }

        tracing::debug!(key = %grant.key, bytes = image.bytes.len(), "Picture uploaded to storage");
        Ok(())
    }

    async fn attach(
        &self,
        lead_id: Uuid,
        picture_token: &str,
        request: &AttachPictureRequest,
    ) -> Result<(), ApiError> {
        let _: AttachPictureResponse = self
            .post_json(
                &format!("/leads/{}/pictures", lead_id),
                request,
                Some(picture_token),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_uses_code() {
        let err = server_error(
            400,
            r#"{"error":"File extension does not match content type","code":"TYPE_MISMATCH","recoverable":false}"#,
        );
        assert_eq!(err.kind, ApiErrorKind::TypeMismatch);
        assert_eq!(err.status, Some(400));
        assert_eq!(err.message, "File extension does not match content type");
    }

    #[test]
    fn test_server_error_without_json_body() {
        let err = server_error(503, "<html>Service Unavailable</html>");
        assert_eq!(err.kind, ApiErrorKind::Transient);
        assert!(err.message.contains("503"));
    }

    #[test]
    fn test_base_url_trimmed() {
        let api = HttpLeadApi::new("http://localhost:4000/", Duration::from_secs(5)).unwrap();
        assert_eq!(api.build_url("/leads"), "http://localhost:4000/leads");
    }
}

//! Upload broker
//!
//! Pictures go straight from the client to object storage. The broker issues the presigned
//! POST grant that constrains what may be uploaded, and later re-checks what actually landed
//! in the bucket with a HEAD request before anything is written to the lead.

use leadcap_core::constants::META_LEAD_ID_KEY;
use leadcap_core::models::PresignPictureResponse;
use leadcap_core::validation::check_presign;
use leadcap_core::{AppError, Config};
use leadcap_storage::keys::{belongs_to_lead, generate_picture_key};
use leadcap_storage::{ObjectHead, ObjectStorage, PostPolicy, StorageError};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::error::storage_error_to_app;

/// Limits every grant and every verification is held to
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_image_bytes: u64,
    pub allowed_types: Vec<String>,
    pub server_side_encryption: String,
    pub presigned_url_ttl: Duration,
}

impl UploadPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_image_bytes: config.max_image_bytes(),
            allowed_types: config.allowed_image_types().to_vec(),
            server_side_encryption: config.storage().server_side_encryption.clone(),
            presigned_url_ttl: Duration::from_secs(config.storage().presigned_url_ttl_secs),
        }
    }
}

#[derive(Clone)]
pub struct UploadBroker {
    storage: Arc<dyn ObjectStorage>,
    policy: UploadPolicy,
}

impl UploadBroker {
    pub fn new(storage: Arc<dyn ObjectStorage>, policy: UploadPolicy) -> Self {
        Self { storage, policy }
    }

    /// Validate the declared file, derive a fresh key under the lead and sign a grant for it.
    /// Type checks happen before storage is touched.
    #[tracing::instrument(skip(self), fields(operation = "presign_picture"))]
    pub async fn presign(
        &self,
        lead_id: Uuid,
        file_name: &str,
        content_type: &str,
    ) -> Result<PresignPictureResponse, AppError> {
        check_presign(&self.policy.allowed_types, file_name, content_type)?;

        let key = generate_picture_key(lead_id, file_name);

        let mut metadata = BTreeMap::new();
        metadata.insert(META_LEAD_ID_KEY.to_string(), lead_id.to_string());

        let post_policy = PostPolicy {
            key: key.clone(),
            content_type: content_type.to_string(),
            max_bytes: self.policy.max_image_bytes,
            server_side_encryption: self.policy.server_side_encryption.clone(),
            metadata,
            expires_in: self.policy.presigned_url_ttl,
        };

        let grant = self
            .storage
            .presigned_post(&post_policy)
            .await
            .map_err(storage_error_to_app)?;
        let access_url = self.read_url(&key).await?;

        tracing::info!(lead_id = %lead_id, key = %key, "Issued presigned picture upload");

        Ok(PresignPictureResponse {
            url: grant.url,
            fields: grant.fields,
            access_url,
            key,
        })
    }

    /// Re-check the stored object against the policy and the lead it claims to belong to.
    #[tracing::instrument(skip(self), fields(operation = "verify_picture"))]
    pub async fn verify(
        &self,
        lead_id: Uuid,
        key: &str,
        declared_mime_type: &str,
    ) -> Result<(), AppError> {
        if !belongs_to_lead(key, lead_id) {
            tracing::warn!(lead_id = %lead_id, key = %key, "Attach key outside lead prefix");
            return Err(not_owned());
        }

        let start = Instant::now();
        let head = match self.storage.head(key).await {
            Ok(head) => head,
            Err(StorageError::NotFound(_)) => {
                tracing::warn!(lead_id = %lead_id, key = %key, "Attach for missing object");
                return Err(AppError::VerificationFailed(
                    "Uploaded file not found".to_string(),
                ));
            }
            Err(e) => return Err(storage_error_to_app(e)),
        };
        tracing::debug!(
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Fetched object head"
        );

        self.check_head(lead_id, declared_mime_type, &head)
            .inspect_err(|e| {
                tracing::warn!(lead_id = %lead_id, key = %key, reason = %e, "Picture verification failed");
            })
    }

    fn check_head(
        &self,
        lead_id: Uuid,
        declared_mime_type: &str,
        head: &ObjectHead,
    ) -> Result<(), AppError> {
        match head.content_length {
            Some(len) if len >= 1 && len <= self.policy.max_image_bytes => {}
            _ => {
                return Err(AppError::VerificationFailed(
                    "Uploaded file exceeds size limit".to_string(),
                ))
            }
        }

        let content_type_matches = head
            .content_type
            .as_deref()
            .is_some_and(|ct| ct == declared_mime_type);
        if !content_type_matches {
            return Err(AppError::VerificationFailed(
                "Uploaded file type mismatch".to_string(),
            ));
        }

        if head.server_side_encryption.as_deref()
            != Some(self.policy.server_side_encryption.as_str())
        {
            return Err(AppError::VerificationFailed(
                "Uploaded file is not encrypted".to_string(),
            ));
        }

        let lead = lead_id.to_string();
        if head.metadata.get(META_LEAD_ID_KEY) != Some(&lead) {
            return Err(not_owned());
        }

        Ok(())
    }

    pub async fn read_url(&self, key: &str) -> Result<String, AppError> {
        self.storage
            .presigned_get(key, self.policy.presigned_url_ttl)
            .await
            .map_err(storage_error_to_app)
    }
}

fn not_owned() -> AppError {
    AppError::VerificationFailed("Uploaded file does not belong to lead".to_string())
}

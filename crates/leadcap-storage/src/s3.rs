use crate::post_policy::{PostPolicySigner, SigningCredentials};
use crate::traits::{
    ObjectHead, ObjectStorage, PostPolicy, PresignedPost, StorageError, StorageResult,
};
use async_trait::async_trait;
use aws_config::retry::{RetryConfig, RetryMode};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use leadcap_core::StorageConfig;
use std::time::Duration;

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    signer: PostPolicySigner,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// A custom `endpoint` (e.g. "http://localhost:9000" for MinIO) switches the client and
    /// the upload URL to path-style addressing.
    pub fn new(config: &StorageConfig) -> StorageResult<Self> {
        if config.bucket.is_empty() {
            return Err(StorageError::ConfigError("S3_BUCKET not configured".to_string()));
        }
        if config.region.is_empty() {
            return Err(StorageError::ConfigError(
                "S3_REGION or AWS_REGION not configured".to_string(),
            ));
        }

        let credentials = SigningCredentials {
            access_key_id: config.access_key_id.clone(),
            secret_access_key: config.secret_access_key.clone(),
            session_token: config.session_token.clone(),
        };

        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_retry_mode(RetryMode::Standard);

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(Credentials::new(
                credentials.access_key_id.clone(),
                credentials.secret_access_key.clone(),
                credentials.session_token.clone(),
                None,
                "leadcap",
            ))
            .retry_config(retry_config);

        // Path-style addressing for S3-compatible providers (required for MinIO, etc.)
        if let Some(ref endpoint) = config.endpoint {
            s3_config_builder = s3_config_builder
                .endpoint_url(endpoint)
                .force_path_style(true);
        }

        let client = Client::from_conf(s3_config_builder.build());
        let signer = PostPolicySigner::new(
            credentials,
            config.bucket.clone(),
            config.region.clone(),
            config.endpoint.clone(),
        );

        Ok(S3Storage {
            client,
            bucket: config.bucket.clone(),
            signer,
        })
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn presigned_post(&self, policy: &PostPolicy) -> StorageResult<PresignedPost> {
        let post = self.signer.sign(policy, chrono::Utc::now())?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %policy.key,
            content_type = %policy.content_type,
            max_bytes = policy.max_bytes,
            expires_in_secs = policy.expires_in.as_secs(),
            "S3 POST policy signed"
        );

        Ok(post)
    }

    async fn presigned_get(&self, storage_key: &str, expires_in: Duration) -> StorageResult<String> {
        let presigning_config = PresigningConfig::builder()
            .expires_in(expires_in)
            .build()
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        let presigned_request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(storage_key)
            .presigned(presigning_config)
            .await
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        Ok(presigned_request.uri().to_string())
    }

    async fn head(&self, storage_key: &str) -> StorageResult<ObjectHead> {
        let start = std::time::Instant::now();

        let output = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(storage_key)
            .send()
            .await
            .map_err(|e| match &e {
                SdkError::ServiceError(service_err)
                    if matches!(service_err.err(), HeadObjectError::NotFound(_)) =>
                {
                    StorageError::NotFound(storage_key.to_string())
                }
                _ => {
                    tracing::error!(
                        error = %e,
                        bucket = %self.bucket,
                        key = %storage_key,
                        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                        "S3 head failed"
                    );
                    StorageError::BackendError(e.to_string())
                }
            })?;

        let head = ObjectHead {
            content_length: output
                .content_length()
                .and_then(|len| u64::try_from(len).ok()),
            content_type: output.content_type().map(String::from),
            server_side_encryption: output
                .server_side_encryption()
                .map(|sse| sse.as_str().to_string()),
            metadata: output
                .metadata()
                .map(|meta| {
                    meta.iter()
                        .map(|(k, v)| (k.to_lowercase(), v.clone()))
                        .collect()
                })
                .unwrap_or_default(),
        };

        tracing::debug!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = ?head.content_length,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 head successful"
        );

        Ok(head)
    }
}

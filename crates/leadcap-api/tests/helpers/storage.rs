//! In-memory object storage that behaves like S3 for presigned POST uploads.
//!
//! Grants are signed with the real `PostPolicySigner`. `upload` plays the role of the bucket:
//! it checks the signature, then every policy condition, before storing the object head.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use leadcap_storage::post_policy::{derive_signing_key, sign_policy};
use leadcap_storage::{
    ObjectHead, ObjectStorage, PostPolicy, PostPolicySigner, PresignedPost, SigningCredentials,
    StorageError, StorageResult,
};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

pub const TEST_BUCKET: &str = "leadcap-test";
pub const TEST_REGION: &str = "eu-central-1";
pub const TEST_SECRET_KEY: &str = "test-secret-access-key";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejected {
    BadSignature,
    PolicyViolation(String),
}

pub struct FakeObjectStorage {
    signer: PostPolicySigner,
    objects: Mutex<HashMap<String, ObjectHead>>,
    pub presign_calls: Mutex<usize>,
    pub head_calls: Mutex<usize>,
    fail_heads: Mutex<bool>,
}

impl Default for FakeObjectStorage {
    fn default() -> Self {
        let credentials = SigningCredentials {
            access_key_id: "AKIDTEST".to_string(),
            secret_access_key: TEST_SECRET_KEY.to_string(),
            session_token: None,
        };
        Self {
            signer: PostPolicySigner::new(
                credentials,
                TEST_BUCKET.to_string(),
                TEST_REGION.to_string(),
                None,
            ),
            objects: Mutex::new(HashMap::new()),
            presign_calls: Mutex::new(0),
            head_calls: Mutex::new(0),
            fail_heads: Mutex::new(false),
        }
    }
}

impl FakeObjectStorage {
    /// Simulate the browser-style multipart POST of `size` bytes with the given form fields.
    pub fn upload(&self, fields: &BTreeMap<String, String>, size: u64) -> Result<(), Rejected> {
        let encoded = fields
            .get("Policy")
            .ok_or_else(|| Rejected::PolicyViolation("missing Policy".into()))?;
        let date = fields
            .get("X-Amz-Date")
            .map(|d| d[..8].to_string())
            .ok_or_else(|| Rejected::PolicyViolation("missing X-Amz-Date".into()))?;

        let key = derive_signing_key(TEST_SECRET_KEY, &date, TEST_REGION, "s3")
            .map_err(|_| Rejected::BadSignature)?;
        let expected = sign_policy(&key, encoded).map_err(|_| Rejected::BadSignature)?;
        if fields.get("X-Amz-Signature") != Some(&expected) {
            return Err(Rejected::BadSignature);
        }

        let raw = STANDARD
            .decode(encoded)
            .map_err(|_| Rejected::PolicyViolation("policy not base64".into()))?;
        let policy: Value = serde_json::from_slice(&raw)
            .map_err(|_| Rejected::PolicyViolation("policy not JSON".into()))?;
        let conditions = policy["conditions"]
            .as_array()
            .ok_or_else(|| Rejected::PolicyViolation("no conditions".into()))?;

        for condition in conditions {
            match condition {
                Value::Array(parts) if parts[0] == "eq" => {
                    let name = parts[1].as_str().unwrap_or_default().trim_start_matches('$');
                    if fields.get(name).map(String::as_str) != parts[2].as_str() {
                        return Err(Rejected::PolicyViolation(format!("{} mismatch", name)));
                    }
                }
                Value::Array(parts) if parts[0] == "content-length-range" => {
                    let min = parts[1].as_u64().unwrap_or(0);
                    let max = parts[2].as_u64().unwrap_or(0);
                    if size < min || size > max {
                        return Err(Rejected::PolicyViolation("EntityTooLarge".into()));
                    }
                }
                Value::Object(map) => {
                    for (name, value) in map {
                        if name == "bucket" {
                            if value != TEST_BUCKET {
                                return Err(Rejected::PolicyViolation("bucket".into()));
                            }
                            continue;
                        }
                        let field = fields
                            .iter()
                            .find(|(k, _)| k.eq_ignore_ascii_case(name))
                            .map(|(_, v)| v.as_str());
                        if field != value.as_str() {
                            return Err(Rejected::PolicyViolation(format!("{} mismatch", name)));
                        }
                    }
                }
                other => {
                    return Err(Rejected::PolicyViolation(format!("unknown condition {}", other)))
                }
            }
        }

        let metadata = fields
            .iter()
            .filter_map(|(k, v)| {
                k.strip_prefix("x-amz-meta-")
                    .map(|name| (name.to_lowercase(), v.clone()))
            })
            .collect();
        let head = ObjectHead {
            content_length: Some(size),
            content_type: fields.get("Content-Type").cloned(),
            server_side_encryption: fields.get("x-amz-server-side-encryption").cloned(),
            metadata,
        };
        self.objects
            .lock()
            .unwrap()
            .insert(fields["key"].clone(), head);
        Ok(())
    }

    /// Place an object directly, bypassing any grant.
    pub fn put_object(&self, key: &str, head: ObjectHead) {
        self.objects.lock().unwrap().insert(key.to_string(), head);
    }

    pub fn fail_heads(&self) {
        *self.fail_heads.lock().unwrap() = true;
    }
}

#[async_trait]
impl ObjectStorage for FakeObjectStorage {
    async fn presigned_post(&self, policy: &PostPolicy) -> StorageResult<PresignedPost> {
        *self.presign_calls.lock().unwrap() += 1;
        self.signer.sign(policy, chrono::Utc::now())
    }

    async fn presigned_get(&self, storage_key: &str, expires_in: Duration) -> StorageResult<String> {
        Ok(format!(
            "https://{}.s3.{}.amazonaws.com/{}?X-Amz-Expires={}",
            TEST_BUCKET,
            TEST_REGION,
            storage_key,
            expires_in.as_secs()
        ))
    }

    async fn head(&self, storage_key: &str) -> StorageResult<ObjectHead> {
        *self.head_calls.lock().unwrap() += 1;
        if *self.fail_heads.lock().unwrap() {
            return Err(StorageError::BackendError(
                "HeadObject: connection reset".to_string(),
            ));
        }
        self.objects
            .lock()
            .unwrap()
            .get(storage_key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }
}

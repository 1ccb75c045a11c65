use async_trait::async_trait;
use leadcap_client::{ApiError, ApiErrorKind, ImageRecord, LeadApi, NetworkMonitor};
use leadcap_core::models::{
    AttachPictureRequest, CreateLeadRequest, CreateLeadResponse, PresignPictureRequest,
    PresignPictureResponse,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedPicture {
    pub lead_id: Uuid,
    pub key: String,
    pub original_name: String,
}

/// Lead API double with scriptable failures. Leads and pictures are kept in memory.
#[derive(Default)]
pub struct ScriptedApi {
    create_calls: AtomicUsize,
    presign_calls: AtomicUsize,
    created: Mutex<Vec<Uuid>>,
    attached: Mutex<Vec<AttachedPicture>>,
    fail_create: Mutex<bool>,
    fail_attach_for: Mutex<Option<String>>,
    offline_after_attaches: Mutex<Option<(usize, NetworkMonitor)>>,
    presign_gate: Option<Arc<Notify>>,
}

impl ScriptedApi {
    /// Presign calls wait until the returned gate is notified.
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        (
            Self {
                presign_gate: Some(gate.clone()),
                ..Self::default()
            },
            gate,
        )
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn presign_calls(&self) -> usize {
        self.presign_calls.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> Vec<Uuid> {
        self.created.lock().unwrap().clone()
    }

    pub fn attached(&self) -> Vec<AttachedPicture> {
        self.attached.lock().unwrap().clone()
    }

    pub fn attached_names(&self) -> Vec<String> {
        self.attached()
            .into_iter()
            .map(|p| p.original_name)
            .collect()
    }

    pub fn set_fail_create(&self, fail: bool) {
        *self.fail_create.lock().unwrap() = fail;
    }

    /// Attach of the picture named `file_name` fails verification until reset with `None`.
    pub fn fail_attach_for(&self, file_name: Option<&str>) {
        *self.fail_attach_for.lock().unwrap() = file_name.map(str::to_string);
    }

    /// Flip `network` offline once `count` pictures have been attached.
    pub fn go_offline_after(&self, count: usize, network: NetworkMonitor) {
        *self.offline_after_attaches.lock().unwrap() = Some((count, network));
    }
}

#[async_trait]
impl LeadApi for ScriptedApi {
    async fn create_lead(&self, _form: &CreateLeadRequest) -> Result<CreateLeadResponse, ApiError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_create.lock().unwrap() {
            return Err(ApiError::transient("connection reset"));
        }

        let lead_id = Uuid::new_v4();
        self.created.lock().unwrap().push(lead_id);
        Ok(CreateLeadResponse {
            success: true,
            message: "Lead successfully created".to_string(),
            lead_id,
            picture_token: format!("token-{}", lead_id),
        })
    }

    async fn presign(
        &self,
        lead_id: Uuid,
        picture_token: &str,
        request: &PresignPictureRequest,
    ) -> Result<PresignPictureResponse, ApiError> {
        self.presign_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.presign_gate {
            gate.notified().await;
        }
        if picture_token != format!("token-{}", lead_id) {
            return Err(ApiError::new(
                ApiErrorKind::Auth,
                Some(401),
                "Invalid or expired token",
            ));
        }

        let key = format!("leads/{}/{}-{}", lead_id, Uuid::new_v4(), request.file_name);
        let mut fields = BTreeMap::new();
        fields.insert("key".to_string(), key.clone());
        fields.insert("Content-Type".to_string(), request.content_type.clone());
        Ok(PresignPictureResponse {
            url: "https://storage.example".to_string(),
            fields,
            access_url: format!("https://storage.example/{}", key),
            key,
        })
    }

    async fn upload(
        &self,
        grant: &PresignPictureResponse,
        image: &ImageRecord,
    ) -> Result<(), ApiError> {
        assert_eq!(grant.fields.get("Content-Type"), Some(&image.mime_type));
        assert!(!image.bytes.is_empty());
        Ok(())
    }

    async fn attach(
        &self,
        lead_id: Uuid,
        _picture_token: &str,
        request: &AttachPictureRequest,
    ) -> Result<(), ApiError> {
        if self.fail_attach_for.lock().unwrap().as_deref() == Some(request.original_name.as_str()) {
            return Err(ApiError::new(
                ApiErrorKind::VerificationFailed,
                Some(400),
                "Uploaded file type mismatch",
            ));
        }

        let count = {
            let mut attached = self.attached.lock().unwrap();
            attached.push(AttachedPicture {
                lead_id,
                key: request.key.clone(),
                original_name: request.original_name.clone(),
            });
            attached.len()
        };

        if let Some((after, network)) = self.offline_after_attaches.lock().unwrap().as_ref() {
            if count >= *after {
                network.set_online(false);
            }
        }
        Ok(())
    }
}

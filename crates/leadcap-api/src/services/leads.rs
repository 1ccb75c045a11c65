//! Lead service: creation, picture presign and verified attach.

use crate::auth::PictureTokenService;
use crate::services::crm::{CrmForwarder, CrmLead};
use crate::services::upload_broker::UploadBroker;
use leadcap_core::models::{
    CreateLeadRequest, CreateLeadResponse, NewLead, PictureMeta, PresignPictureResponse,
};
use leadcap_core::AppError;
use leadcap_db::LeadRepository;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct LeadService {
    repository: Arc<dyn LeadRepository>,
    broker: UploadBroker,
    crm: Arc<dyn CrmForwarder>,
    tokens: Arc<PictureTokenService>,
}

impl LeadService {
    pub fn new(
        repository: Arc<dyn LeadRepository>,
        broker: UploadBroker,
        crm: Arc<dyn CrmForwarder>,
        tokens: Arc<PictureTokenService>,
    ) -> Self {
        Self {
            repository,
            broker,
            crm,
            tokens,
        }
    }

    /// Persist the lead, mint its picture token and notify the CRM in the background.
    pub async fn create(&self, request: CreateLeadRequest) -> Result<CreateLeadResponse, AppError> {
        let lead = self.repository.create(NewLead::from(request)).await?;
        let picture_token = self.tokens.issue(lead.id)?;

        tracing::info!(lead_id = %lead.id, "Lead created");

        let crm = self.crm.clone();
        let crm_lead = CrmLead::from(&lead);
        let lead_id = lead.id;
        tokio::spawn(async move {
            if let Err(e) = crm.create_lead(crm_lead).await {
                tracing::warn!(lead_id = %lead_id, error = %e, "CRM createLead failed");
            }
        });

        Ok(CreateLeadResponse {
            success: true,
            message: "Lead successfully created".to_string(),
            lead_id: lead.id,
            picture_token,
        })
    }

    pub async fn presign_picture(
        &self,
        lead_id: Uuid,
        file_name: &str,
        content_type: &str,
    ) -> Result<PresignPictureResponse, AppError> {
        self.broker.presign(lead_id, file_name, content_type).await
    }

    /// Verify the stored object, then append its metadata. Nothing is written when
    /// verification fails. The CRM receives a fresh read URL from a detached task.
    pub async fn attach_picture(&self, lead_id: Uuid, picture: PictureMeta) -> Result<(), AppError> {
        self.broker
            .verify(lead_id, &picture.key, &picture.mime_type)
            .await?;

        let lead = self
            .repository
            .append_picture(lead_id, &picture)
            .await?
            .ok_or_else(|| AppError::NotFound("Lead not found".to_string()))?;

        tracing::info!(
            lead_id = %lead.id,
            key = %picture.key,
            picture_count = lead.pictures.len(),
            "Picture attached"
        );

        let broker = self.broker.clone();
        let crm = self.crm.clone();
        let key = picture.key;
        tokio::spawn(async move {
            let result = match broker.read_url(&key).await {
                Ok(url) => crm.attach_lead_picture(lead_id, url).await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                tracing::warn!(lead_id = %lead_id, key = %key, error = %e, "CRM attachLeadPicture failed");
            }
        });

        Ok(())
    }
}

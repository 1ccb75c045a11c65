use async_trait::async_trait;
use leadcap_api::services::{CrmForwarder, CrmLead};
use leadcap_core::AppError;
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrmCall {
    CreateLead(CrmLead),
    AttachPicture { lead_id: Uuid, picture_url: String },
}

/// CRM double that records every call and can be told to fail.
#[derive(Default)]
pub struct RecordingCrm {
    calls: Mutex<Vec<CrmCall>>,
    failing: bool,
}

impl RecordingCrm {
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn calls(&self) -> Vec<CrmCall> {
        self.calls.lock().unwrap().clone()
    }

    /// CRM calls run on detached tasks; poll until `count` have been recorded.
    pub async fn wait_for_calls(&self, count: usize) -> Vec<CrmCall> {
        for _ in 0..100 {
            if self.calls.lock().unwrap().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.calls()
    }

    fn record(&self, call: CrmCall) -> Result<(), AppError> {
        self.calls.lock().unwrap().push(call);
        if self.failing {
            Err(AppError::Upstream("CRM unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CrmForwarder for RecordingCrm {
    async fn create_lead(&self, lead: CrmLead) -> Result<(), AppError> {
        self.record(CrmCall::CreateLead(lead))
    }

    async fn attach_lead_picture(
        &self,
        lead_id: Uuid,
        picture_url: String,
    ) -> Result<(), AppError> {
        self.record(CrmCall::AttachPicture {
            lead_id,
            picture_url,
        })
    }
}

//! CRM forwarding
//!
//! The CRM is a best-effort downstream: it is told about new leads and attached pictures
//! from detached tasks, and its failures never reach the HTTP response.

use async_trait::async_trait;
use leadcap_core::models::Lead;
use leadcap_core::AppError;
use serde::Serialize;
use uuid::Uuid;

/// Lead content handed to the CRM
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrmLead {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub postal_code: String,
    pub salutation: String,
}

impl From<&Lead> for CrmLead {
    fn from(lead: &Lead) -> Self {
        CrmLead {
            first_name: lead.first_name.clone(),
            last_name: lead.last_name.clone(),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            postal_code: lead.postal_code.clone(),
            salutation: lead.salutation.as_str().to_string(),
        }
    }
}

#[async_trait]
pub trait CrmForwarder: Send + Sync {
    async fn create_lead(&self, lead: CrmLead) -> Result<(), AppError>;

    async fn attach_lead_picture(&self, lead_id: Uuid, picture_url: String)
        -> Result<(), AppError>;
}

/// Forwarder that only records the calls in the log. Used until a real CRM is wired in.
#[derive(Debug, Default, Clone)]
pub struct LoggingCrm;

#[async_trait]
impl CrmForwarder for LoggingCrm {
    async fn create_lead(&self, lead: CrmLead) -> Result<(), AppError> {
        tracing::info!(
            has_email = !lead.email.is_empty(),
            has_phone = !lead.phone.is_empty(),
            "CRM createLead"
        );
        Ok(())
    }

    async fn attach_lead_picture(
        &self,
        lead_id: Uuid,
        picture_url: String,
    ) -> Result<(), AppError> {
        tracing::info!(
            lead_id = %lead_id,
            has_picture_url = !picture_url.is_empty(),
            "CRM attachLeadPicture"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use leadcap_core::models::Salutation;

    #[test]
    fn test_crm_lead_mapping() {
        let lead = Lead {
            id: Uuid::new_v4(),
            salutation: Salutation::Divers,
            first_name: "Kim".to_string(),
            last_name: "Schulz".to_string(),
            postal_code: "10115".to_string(),
            email: "kim@example.de".to_string(),
            phone: "030 1234567".to_string(),
            newsletter_single_opt_in: true,
            pictures: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let crm = CrmLead::from(&lead);
        let json = serde_json::to_value(&crm).unwrap();
        assert_eq!(json["firstName"], "Kim");
        assert_eq!(json["postalCode"], "10115");
        assert_eq!(json["salutation"], "DIVERS");
        assert!(json.get("newsletterSingleOptIn").is_none());
    }
}

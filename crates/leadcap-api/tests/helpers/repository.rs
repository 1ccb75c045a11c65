use async_trait::async_trait;
use chrono::Utc;
use leadcap_core::models::{Lead, NewLead, PictureMeta};
use leadcap_core::AppError;
use leadcap_db::LeadRepository;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Lead repository kept in a map; appends are atomic under the mutex.
#[derive(Default)]
pub struct InMemoryLeadRepository {
    leads: Mutex<HashMap<Uuid, Lead>>,
}

impl InMemoryLeadRepository {
    pub fn count(&self) -> usize {
        self.leads.lock().unwrap().len()
    }

    pub fn lead(&self, id: Uuid) -> Option<Lead> {
        self.leads.lock().unwrap().get(&id).cloned()
    }

    pub fn remove(&self, id: Uuid) {
        self.leads.lock().unwrap().remove(&id);
    }
}

#[async_trait]
impl LeadRepository for InMemoryLeadRepository {
    async fn create(&self, lead: NewLead) -> Result<Lead, AppError> {
        let now = Utc::now();
        let lead = Lead {
            id: Uuid::new_v4(),
            salutation: lead.salutation,
            first_name: lead.first_name,
            last_name: lead.last_name,
            postal_code: lead.postal_code,
            email: lead.email,
            phone: lead.phone,
            newsletter_single_opt_in: lead.newsletter_single_opt_in,
            pictures: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.leads.lock().unwrap().insert(lead.id, lead.clone());
        Ok(lead)
    }

    async fn append_picture(
        &self,
        lead_id: Uuid,
        picture: &PictureMeta,
    ) -> Result<Option<Lead>, AppError> {
        let mut leads = self.leads.lock().unwrap();
        Ok(leads.get_mut(&lead_id).map(|lead| {
            lead.pictures.push(picture.clone());
            lead.updated_at = Utc::now();
            lead.clone()
        }))
    }

    async fn get(&self, lead_id: Uuid) -> Result<Option<Lead>, AppError> {
        Ok(self.lead(lead_id))
    }
}

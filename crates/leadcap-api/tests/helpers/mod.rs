//! Test helpers: build the real router over in-memory collaborators.
//!
//! Run from workspace root: `cargo test -p leadcap-api`. No database or bucket is needed.

#![allow(dead_code)]

pub mod crm;
pub mod fixtures;
pub mod repository;
pub mod storage;

use axum_test::{TestResponse, TestServer};
use crm::RecordingCrm;
use leadcap_api::setup::{build_state, routes};
use leadcap_core::{Config, LeadServiceConfig};
use repository::InMemoryLeadRepository;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use storage::FakeObjectStorage;
use uuid::Uuid;

pub const TEST_TOKEN_SECRET: &str = "integration-test-secret-with-32-chars+";
pub const TEST_MAX_IMAGE_BYTES: u64 = 1024 * 1024;

/// Test application: server plus handles on every collaborator.
pub struct TestApp {
    pub server: TestServer,
    pub config: Config,
    pub leads: Arc<InMemoryLeadRepository>,
    pub storage: Arc<FakeObjectStorage>,
    pub crm: Arc<RecordingCrm>,
}

pub fn test_config() -> Config {
    let mut env = HashMap::new();
    env.insert("DATABASE_URL", "postgres://localhost/leadcap_test".to_string());
    env.insert("PICTURE_TOKEN_SECRET", TEST_TOKEN_SECRET.to_string());
    env.insert("MAX_IMAGE_BYTES", TEST_MAX_IMAGE_BYTES.to_string());
    env.insert("S3_BUCKET", storage::TEST_BUCKET.to_string());
    env.insert("S3_REGION", storage::TEST_REGION.to_string());
    env.insert("AWS_ACCESS_KEY_ID", "AKIDTEST".to_string());
    env.insert("AWS_SECRET_ACCESS_KEY", storage::TEST_SECRET_KEY.to_string());
    env.insert("CORS_ORIGINS", "http://localhost:5173".to_string());
    let service = LeadServiceConfig::from_lookup(|key| env.get(key).cloned())
        .expect("test config should parse");
    Config(Box::new(service))
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with_crm(RecordingCrm::default())
}

pub fn setup_test_app_with_crm(crm: RecordingCrm) -> TestApp {
    let config = test_config();
    let leads = Arc::new(InMemoryLeadRepository::default());
    let storage = Arc::new(FakeObjectStorage::default());
    let crm = Arc::new(crm);

    let state = build_state(&config, leads.clone(), storage.clone(), crm.clone());
    let router = routes::setup_routes(&config, state).expect("router should build");
    let server = TestServer::new(router).expect("test server should start");

    TestApp {
        server,
        config,
        leads,
        storage,
        crm,
    }
}

/// A lead created through the API together with its picture token.
pub struct CreatedLead {
    pub id: Uuid,
    pub token: String,
}

impl TestApp {
    pub async fn create_lead(&self) -> CreatedLead {
        let response = self.server.post("/leads").json(&fixtures::lead_payload()).await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = response.json();
        CreatedLead {
            id: body["leadId"].as_str().unwrap().parse().unwrap(),
            token: body["pictureToken"].as_str().unwrap().to_string(),
        }
    }

    pub async fn presign(
        &self,
        lead_id: Uuid,
        token: &str,
        file_name: &str,
        content_type: &str,
    ) -> TestResponse {
        self.server
            .post(&format!("/leads/{}/pictures/presign", lead_id))
            .authorization_bearer(token)
            .json(&json!({ "fileName": file_name, "contentType": content_type }))
            .await
    }

    pub async fn attach(
        &self,
        lead_id: Uuid,
        token: &str,
        key: &str,
        mime_type: &str,
        original_name: &str,
    ) -> TestResponse {
        self.server
            .post(&format!("/leads/{}/pictures", lead_id))
            .authorization_bearer(token)
            .json(&json!({ "key": key, "mimeType": mime_type, "originalName": original_name }))
            .await
    }
}

pub fn grant_fields(body: &Value) -> BTreeMap<String, String> {
    body["fields"]
        .as_object()
        .unwrap()
        .iter()
        .map(|(k, v)| (k.clone(), v.as_str().unwrap().to_string()))
        .collect()
}

#![allow(dead_code)]

pub mod api;

use leadcap_client::{NetworkMonitor, NewImage, Orchestrator, SqliteDraftRepository};
use leadcap_core::models::Salutation;
use leadcap_core::validation::LeadForm;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub use api::ScriptedApi;

pub const TEST_QUOTA_BYTES: u64 = 1024;

pub struct TestClient {
    pub orchestrator: Arc<Orchestrator>,
    pub drafts: Arc<SqliteDraftRepository>,
    pub api: Arc<ScriptedApi>,
    pub network: NetworkMonitor,
}

pub async fn setup_client(online: bool) -> TestClient {
    setup_client_with(online, ScriptedApi::default(), TEST_QUOTA_BYTES).await
}

pub async fn setup_client_with(online: bool, api: ScriptedApi, quota_bytes: u64) -> TestClient {
    let drafts = Arc::new(SqliteDraftRepository::in_memory(quota_bytes).await.unwrap());
    build(drafts, Arc::new(api), NetworkMonitor::new(online)).await
}

/// Client whose draft lives in a SQLite file, as it does on a device.
pub async fn setup_client_at(path: &Path, online: bool, api: Arc<ScriptedApi>) -> TestClient {
    let drafts = Arc::new(
        SqliteDraftRepository::open(path, TEST_QUOTA_BYTES)
            .await
            .unwrap(),
    );
    build(drafts, api, NetworkMonitor::new(online)).await
}

async fn build(
    drafts: Arc<SqliteDraftRepository>,
    api: Arc<ScriptedApi>,
    network: NetworkMonitor,
) -> TestClient {
    let orchestrator = Orchestrator::restore(drafts.clone(), api.clone(), network.clone())
        .await
        .unwrap();
    TestClient {
        orchestrator: Arc::new(orchestrator),
        drafts,
        api,
        network,
    }
}

pub fn valid_form() -> LeadForm {
    LeadForm {
        salutation: Some(Salutation::Female),
        first_name: "Erika".to_string(),
        last_name: "Mustermann".to_string(),
        postal_code: "10115".to_string(),
        email: "erika@example.de".to_string(),
        phone: "030 1234567".to_string(),
        privacy_accepted: true,
        newsletter_single_opt_in: false,
    }
}

pub fn image(name: &str, size: usize) -> NewImage {
    NewImage {
        file_name: name.to_string(),
        mime_type: "image/jpeg".to_string(),
        bytes: vec![0xFF; size],
    }
}

/// Poll `condition` until it holds or a second has passed.
pub async fn eventually<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

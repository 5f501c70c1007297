//! Shared test helpers for record API integration tests
//!
//! Provides wiremock-based mock server setup for the record endpoints.
//! Each helper mounts the necessary mocks and returns a configured store
//! pointing at the mock server.

use std::sync::Arc;

use cardbox_core::config::{RemoteConfig, RetryConfig};
use cardbox_core::ports::auth::StaticTokenProvider;
use cardbox_remote::{RecordApiStore, RemoteRecordClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fast retries so failure-path tests do not sleep for real seconds
pub fn test_retry_config() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        base_delay_ms: 10,
    }
}

/// Builds a store pointed at the given mock server
pub fn store_for(server: &MockServer) -> RecordApiStore {
    let client = Arc::new(RemoteRecordClient::new(
        server.uri(),
        Some("app-test-001".to_string()),
        Arc::new(StaticTokenProvider::new("test-access-token")),
    ));
    RecordApiStore::new(client, RemoteConfig::default(), test_retry_config())
}

/// Mounts a GET record endpoint returning the given JSON document
pub async fn mount_get_record(server: &MockServer, record_id: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/records/{record_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mounts a PUT record endpoint that accepts any body
pub async fn mount_put_record(server: &MockServer, record_id: &str) {
    Mock::given(method("PUT"))
        .and(path(format!("/records/{record_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": record_id
        })))
        .mount(server)
        .await;
}

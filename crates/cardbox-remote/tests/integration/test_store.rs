//! Record store integration tests against a mock record API

use cardbox_core::domain::newtypes::RecordId;
use cardbox_core::domain::record::{FieldChanges, FieldRole};
use cardbox_core::ports::record_store::RecordStore;
use chrono::Utc;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{mount_get_record, mount_put_record, store_for};

fn record_id() -> RecordId {
    RecordId::new("rec-001").unwrap()
}

#[tokio::test]
async fn test_fetch_decodes_stringified_fields() {
    let server = MockServer::start().await;
    mount_get_record(
        &server,
        "rec-001",
        json!({
            "id": "rec-001",
            "cardBank": "[{\"kind\":\"flashcard\",\"id\":\"c1\"}]",
            "colorMapping": "%7B%22Biology%22%3A%7B%22base%22%3A%22%234363d8%22%7D%7D",
            "lastSaved": "2026-02-01T10:00:00Z"
        }),
    )
    .await;

    let store = store_for(&server);
    let record = store.fetch(&record_id()).await.unwrap();

    assert_eq!(
        record.field(FieldRole::CardBank),
        Some(&json!([{"kind": "flashcard", "id": "c1"}]))
    );
    // Percent-encoded fields are decoded before parsing.
    assert_eq!(
        record.field(FieldRole::ColorMapping),
        Some(&json!({"Biology": {"base": "#4363d8"}}))
    );
    assert_eq!(
        record.field(FieldRole::LastSaved),
        Some(&json!("2026-02-01T10:00:00Z"))
    );
}

#[tokio::test]
async fn test_fetch_recovers_malformed_json_fields() {
    let server = MockServer::start().await;
    mount_get_record(
        &server,
        "rec-001",
        json!({
            "id": "rec-001",
            // Trailing comma: recovered by the codec's cleanup pass.
            "box1": "[{\"cardId\":\"c1\"},]",
            // Hopeless: dropped, not fatal.
            "box2": "certainly not json",
            "box3": null
        }),
    )
    .await;

    let store = store_for(&server);
    let record = store.fetch(&record_id()).await.unwrap();

    assert_eq!(
        record.field(FieldRole::Box1),
        Some(&json!([{"cardId": "c1"}]))
    );
    assert!(record.field(FieldRole::Box2).is_none());
    assert!(record.field(FieldRole::Box3).is_none());
}

#[tokio::test]
async fn test_write_stringifies_collections() {
    let server = MockServer::start().await;
    mount_put_record(&server, "rec-001").await;

    let store = store_for(&server);
    let mut changes = FieldChanges::with_timestamp(Utc::now());
    changes.set(FieldRole::CardBank, json!([{"kind": "flashcard", "id": "c1"}]));

    store.write(&record_id(), &changes).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let put = requests
        .iter()
        .find(|r| r.method.as_str() == "PUT")
        .expect("PUT request");
    let body: serde_json::Value = serde_json::from_slice(&put.body).unwrap();

    // Collections travel JSON-stringified; the timestamp stays a scalar.
    let bank = body["cardBank"].as_str().expect("stringified card bank");
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(bank).unwrap(),
        json!([{"kind": "flashcard", "id": "c1"}])
    );
    assert!(body["lastSaved"].as_str().is_some());

    // Authentication and app headers are present.
    assert_eq!(
        put.headers.get("authorization").unwrap().to_str().unwrap(),
        "Bearer test-access-token"
    );
    assert_eq!(
        put.headers
            .get("x-application-id")
            .unwrap()
            .to_str()
            .unwrap(),
        "app-test-001"
    );
}

#[tokio::test]
async fn test_write_retries_transient_errors() {
    let server = MockServer::start().await;

    // First two attempts fail with 503, the third succeeds.
    Mock::given(method("PUT"))
        .and(path("/records/rec-001"))
        .respond_with(ResponseTemplate::new(503).set_body_string("try later"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_put_record(&server, "rec-001").await;

    let store = store_for(&server);
    let changes = FieldChanges::with_timestamp(Utc::now());
    store.write(&record_id(), &changes).await.unwrap();

    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_write_exhaustion_surfaces_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/records/rec-001"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let changes = FieldChanges::with_timestamp(Utc::now());
    let err = store.write(&record_id(), &changes).await.unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("500"), "missing status: {message}");
    assert!(message.contains("backend exploded"), "missing body: {message}");
    // Attempt limit respected.
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_fetch_not_found_fails_fast() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/records/rec-001"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such record"))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let err = store.fetch(&record_id()).await.unwrap_err();

    assert!(format!("{err:#}").contains("404"));
    // Non-transient: no retries.
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

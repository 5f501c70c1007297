//! RecordStore port implementation
//!
//! Maps logical field roles to backend column identifiers, funnels fetched
//! field text through the resilient codec, and wraps both directions in the
//! retry helper. Collections are written JSON-stringified, the way the
//! backend stores them; the last-saved timestamp is written as a plain
//! scalar.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use cardbox_core::config::{RemoteConfig, RetryConfig};
use cardbox_core::domain::newtypes::RecordId;
use cardbox_core::domain::record::{FieldChanges, FieldRole, RemoteRecord, WriteAck};
use cardbox_core::ports::record_store::RecordStore;
use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::client::RemoteRecordClient;
use crate::retry::with_retry;

/// [`RecordStore`] adapter over the record API
pub struct RecordApiStore {
    client: Arc<RemoteRecordClient>,
    remote: RemoteConfig,
    retry: RetryConfig,
}

impl RecordApiStore {
    pub fn new(client: Arc<RemoteRecordClient>, remote: RemoteConfig, retry: RetryConfig) -> Self {
        Self {
            client,
            remote,
            retry,
        }
    }

    fn base_delay(&self) -> Duration {
        Duration::from_millis(self.retry.base_delay_ms)
    }

    /// Decodes one raw field value to JSON
    ///
    /// The backend stores collections as (possibly percent-encoded) JSON
    /// strings, but already-parsed values pass through unchanged. A field
    /// that fails every codec stage is dropped from the record, which the
    /// preparer treats the same as an absent field.
    fn decode_value(role: FieldRole, raw: &Value) -> Option<Value> {
        match raw {
            Value::Null => None,
            Value::String(text) if role != FieldRole::LastSaved => {
                if text.trim().is_empty() {
                    return None;
                }
                match cardbox_codec::parse_json(&cardbox_codec::decode(text)) {
                    Ok(value) => Some(value),
                    Err(err) => {
                        warn!(
                            field = %role,
                            error = %err,
                            "Dropping unrecoverable field (data loss risk)"
                        );
                        None
                    }
                }
            }
            other => Some(other.clone()),
        }
    }

    /// Serializes one field change for the PUT body
    fn encode_value(role: FieldRole, value: &Value) -> Value {
        match (role, value) {
            // The timestamp field is a plain scalar.
            (FieldRole::LastSaved, v) => v.clone(),
            // Collections are stored JSON-stringified.
            (_, v) => Value::String(v.to_string()),
        }
    }
}

#[async_trait]
impl RecordStore for RecordApiStore {
    async fn fetch(&self, record_id: &RecordId) -> Result<RemoteRecord> {
        let raw = with_retry(
            "fetch_record",
            self.retry.max_attempts,
            self.base_delay(),
            || self.client.get_record(record_id),
        )
        .await
        .context("Failed to fetch remote record")?;

        let mut record = RemoteRecord::new(record_id.clone());
        for role in FieldRole::ALL {
            let field_id = self.remote.field_id(role);
            let Some(value) = raw.get(&field_id) else {
                continue;
            };
            if let Some(decoded) = Self::decode_value(role, value) {
                record.fields.insert(role, decoded);
            }
        }

        debug!(
            record_id = %record_id,
            fields = record.fields.len(),
            "Fetched and decoded remote record"
        );
        Ok(record)
    }

    async fn write(&self, record_id: &RecordId, changes: &FieldChanges) -> Result<WriteAck> {
        let mut body = Map::new();
        for (role, value) in changes.iter() {
            body.insert(self.remote.field_id(*role), Self::encode_value(*role, value));
        }

        with_retry(
            "write_record",
            self.retry.max_attempts,
            self.base_delay(),
            || self.client.put_record(record_id, &body),
        )
        .await
        .context("Failed to write remote record")?;

        Ok(WriteAck {
            saved_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_value_passthrough_for_parsed_fields() {
        let value = json!([{"kind": "flashcard"}]);
        assert_eq!(
            RecordApiStore::decode_value(FieldRole::CardBank, &value),
            Some(value)
        );
    }

    #[test]
    fn test_decode_value_stringified() {
        let value = json!("[1,2,3]");
        assert_eq!(
            RecordApiStore::decode_value(FieldRole::Box1, &value),
            Some(json!([1, 2, 3]))
        );
    }

    #[test]
    fn test_decode_value_percent_encoded() {
        let value = json!("%7B%22a%22%3A1%7D");
        assert_eq!(
            RecordApiStore::decode_value(FieldRole::ColorMapping, &value),
            Some(json!({"a": 1}))
        );
    }

    #[test]
    fn test_decode_value_null_and_empty_dropped() {
        assert_eq!(
            RecordApiStore::decode_value(FieldRole::CardBank, &Value::Null),
            None
        );
        assert_eq!(
            RecordApiStore::decode_value(FieldRole::CardBank, &json!("  ")),
            None
        );
    }

    #[test]
    fn test_decode_value_timestamp_stays_scalar() {
        let value = json!("2026-02-01T10:00:00Z");
        assert_eq!(
            RecordApiStore::decode_value(FieldRole::LastSaved, &value),
            Some(value)
        );
    }

    #[test]
    fn test_encode_value_stringifies_collections() {
        let encoded = RecordApiStore::encode_value(FieldRole::CardBank, &json!([1, 2]));
        assert_eq!(encoded, json!("[1,2]"));

        let encoded =
            RecordApiStore::encode_value(FieldRole::LastSaved, &json!("2026-02-01T10:00:00Z"));
        assert_eq!(encoded, json!("2026-02-01T10:00:00Z"));
    }
}

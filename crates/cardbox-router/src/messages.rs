//! Request and response message envelopes
//!
//! Wire shape: JSON objects tagged with a `type` field, matching the
//! cross-context message contract the UI speaks. Requests carry their
//! required fields inline; responses always carry `success` or an
//! equivalent error variant so callers never have to infer an outcome.

use cardbox_core::domain::card::Flashcard;
use cardbox_core::domain::save_op::SavePayload;
use cardbox_core::domain::topic::TopicList;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound cross-context requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum Request {
    SaveData {
        record_id: String,
        data: SavePayload,
        #[serde(default)]
        preserve_fields: Option<bool>,
    },
    AddToBank {
        record_id: String,
        cards: Vec<Flashcard>,
    },
    TopicListsUpdated {
        record_id: String,
        topic_lists: Vec<TopicList>,
    },
    DeleteSubject {
        record_id: String,
        subject: String,
    },
    DeleteTopic {
        record_id: String,
        subject: String,
        topic: String,
    },
    RequestUpdatedData {
        record_id: String,
    },
    /// Alias of [`Request::RequestUpdatedData`] kept for older clients
    ReloadAppData {
        record_id: String,
    },
    RequestRecordId,
    TokenRefresh,
}

/// Outbound responses; exactly one per request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum Response {
    SaveResult {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    AddToBankResult {
        success: bool,
        should_reload: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    TopicListsUpdateResult {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    DeleteSubjectResult {
        success: bool,
        subject: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    DeleteTopicResult {
        success: bool,
        subject: String,
        topic: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    RecordData {
        record_id: String,
        cards: Value,
        color_mapping: Value,
        topic_lists: Value,
        spaced_repetition: Value,
    },
    DataRefreshError {
        error: String,
    },
    RecordIdResponse {
        record_id: String,
    },
    RecordIdError {
        error: String,
    },
    TokenRefreshResult {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl Response {
    /// Whether this response reports success
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            Response::SaveResult { success, .. }
            | Response::AddToBankResult { success, .. }
            | Response::TopicListsUpdateResult { success, .. }
            | Response::DeleteSubjectResult { success, .. }
            | Response::DeleteTopicResult { success, .. }
            | Response::TokenRefreshResult { success, .. } => *success,
            Response::RecordData { .. } | Response::RecordIdResponse { .. } => true,
            Response::DataRefreshError { .. } | Response::RecordIdError { .. } => false,
        }
    }
}

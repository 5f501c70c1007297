//! Save operations
//!
//! A [`SaveOperation`] is the unit of work the save queue serializes: one
//! logical update (full save or topic-list save) against the remote record.
//! Once enqueued it is owned by the queue until it either succeeds or
//! exhausts its retries; completion is signalled back to the caller through
//! a one-shot future held outside this module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::boxes::BoxSet;
use super::card::CardBankItem;
use super::color_map::ColorMapping;
use super::errors::DomainError;
use super::newtypes::RecordId;
use super::topic::TopicList;

/// What kind of update a save operation performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Write every payload section that is present
    Full,
    /// Write only the topic-list field
    TopicLists,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationKind::Full => write!(f, "full"),
            OperationKind::TopicLists => write!(f, "topic_lists"),
        }
    }
}

/// Typed payload of a save operation; sections absent from the payload are
/// left untouched remotely (or carried forward under field preservation)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cards: Option<Vec<CardBankItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_mapping: Option<ColorMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spaced_repetition: Option<BoxSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_lists: Option<Vec<TopicList>>,
}

impl SavePayload {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_none()
            && self.color_mapping.is_none()
            && self.spaced_repetition.is_none()
            && self.topic_metadata.is_none()
            && self.topic_lists.is_none()
    }
}

/// One queued update against the remote record
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOperation {
    pub kind: OperationKind,
    pub record_id: RecordId,
    pub payload: SavePayload,
    /// Carry forward remote fields this operation does not touch
    pub preserve_fields: bool,
    pub created_at: DateTime<Utc>,
}

impl SaveOperation {
    pub fn new(kind: OperationKind, record_id: RecordId, payload: SavePayload) -> Self {
        Self {
            kind,
            record_id,
            payload,
            preserve_fields: false,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_preserve_fields(mut self, preserve: bool) -> Self {
        self.preserve_fields = preserve;
        self
    }

    /// Checks the invariants the queue enforces before accepting an
    /// operation: a topic-list save must actually carry topic lists.
    ///
    /// The record id and kind are guaranteed present by construction; this
    /// catches the payload-shape mismatches that used to surface as opaque
    /// remote API errors.
    pub fn validate(&self) -> Result<(), DomainError> {
        match self.kind {
            OperationKind::TopicLists if self.payload.topic_lists.is_none() => Err(
                DomainError::ValidationFailed("topic_lists save without topic lists".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

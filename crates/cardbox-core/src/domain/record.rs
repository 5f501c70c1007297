//! The remote record and its field-level change sets
//!
//! The backend stores one JSON document per user. Each logical field is
//! addressed by a [`FieldRole`]; backend-specific column identifiers are an
//! adapter concern, never referenced here. A write is always a partial
//! document PUT expressed as a [`FieldChanges`] set.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::newtypes::{BoxNumber, RecordId};

// ============================================================================
// FieldRole
// ============================================================================

/// Logical role of one remote record field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldRole {
    /// Mixed array of topic shells and flashcards
    CardBank,
    /// Subject -> colors object
    ColorMapping,
    Box1,
    Box2,
    Box3,
    Box4,
    Box5,
    /// Per-topic metadata array (exam context, ordering)
    TopicMetadata,
    /// Curated topic outlines per subject
    TopicLists,
    /// ISO-8601 timestamp of the last successful save
    LastSaved,
}

impl FieldRole {
    /// All roles, in stable order
    pub const ALL: [FieldRole; 10] = [
        FieldRole::CardBank,
        FieldRole::ColorMapping,
        FieldRole::Box1,
        FieldRole::Box2,
        FieldRole::Box3,
        FieldRole::Box4,
        FieldRole::Box5,
        FieldRole::TopicMetadata,
        FieldRole::TopicLists,
        FieldRole::LastSaved,
    ];

    /// Roles subject to field preservation (everything except the timestamp)
    pub fn preserved() -> impl Iterator<Item = FieldRole> {
        Self::ALL
            .into_iter()
            .filter(|r| !matches!(r, FieldRole::LastSaved))
    }

    /// The box field for a given Leitner box number
    #[must_use]
    pub fn for_box(num: BoxNumber) -> FieldRole {
        match num.get() {
            1 => FieldRole::Box1,
            2 => FieldRole::Box2,
            3 => FieldRole::Box3,
            4 => FieldRole::Box4,
            _ => FieldRole::Box5,
        }
    }

    /// Stable snake-ish name used in logs and config keys
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldRole::CardBank => "cardBank",
            FieldRole::ColorMapping => "colorMapping",
            FieldRole::Box1 => "box1",
            FieldRole::Box2 => "box2",
            FieldRole::Box3 => "box3",
            FieldRole::Box4 => "box4",
            FieldRole::Box5 => "box5",
            FieldRole::TopicMetadata => "topicMetadata",
            FieldRole::TopicLists => "topicLists",
            FieldRole::LastSaved => "lastSaved",
        }
    }
}

impl std::fmt::Display for FieldRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// RemoteRecord
// ============================================================================

/// The fetched remote record, fields already decoded to JSON values
///
/// Fields the backend returned as null or that failed every codec recovery
/// stage are simply absent from the map.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRecord {
    pub id: RecordId,
    pub fields: BTreeMap<FieldRole, Value>,
}

impl RemoteRecord {
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn field(&self, role: FieldRole) -> Option<&Value> {
        self.fields.get(&role).filter(|v| !v.is_null())
    }
}

// ============================================================================
// FieldChanges
// ============================================================================

/// The set of field values one save operation will write
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldChanges {
    values: BTreeMap<FieldRole, Value>,
}

impl FieldChanges {
    /// A change set holding only the last-saved stamp
    #[must_use]
    pub fn with_timestamp(at: DateTime<Utc>) -> Self {
        let mut changes = Self::default();
        changes.set(FieldRole::LastSaved, Value::String(at.to_rfc3339()));
        changes
    }

    pub fn set(&mut self, role: FieldRole, value: Value) {
        self.values.insert(role, value);
    }

    #[must_use]
    pub fn get(&self, role: FieldRole) -> Option<&Value> {
        self.values.get(&role)
    }

    #[must_use]
    pub fn contains(&self, role: FieldRole) -> bool {
        self.values.contains_key(&role)
    }

    /// Copies into this change set every preserved remote field that the
    /// change set does not already touch (field preservation)
    ///
    /// Returns the roles that were carried forward.
    pub fn preserve_from(&mut self, remote: &RemoteRecord) -> Vec<FieldRole> {
        let mut carried = Vec::new();
        for role in FieldRole::preserved() {
            if self.contains(role) {
                continue;
            }
            if let Some(value) = remote.field(role) {
                self.values.insert(role, value.clone());
                carried.push(role);
            }
        }
        carried
    }

    /// True when nothing but the timestamp would be written
    #[must_use]
    pub fn is_timestamp_only(&self) -> bool {
        self.values
            .keys()
            .all(|role| matches!(role, FieldRole::LastSaved))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldRole, &Value)> {
        self.values.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Acknowledgement of a completed remote write
#[derive(Debug, Clone, PartialEq)]
pub struct WriteAck {
    pub saved_at: DateTime<Utc>,
}

//! Save data preparation
//!
//! Turns a logical [`SaveOperation`] into the concrete [`FieldChanges`] a
//! remote write will carry. Always stamps the last-saved timestamp. When
//! the operation asks for field preservation, the current remote record is
//! fetched and every managed field the operation does not touch is carried
//! forward unchanged, so independent producers never clobber each other's
//! fields.

use std::sync::Arc;

use cardbox_core::config::PreservationPolicy;
use cardbox_core::domain::newtypes::BoxNumber;
use cardbox_core::domain::record::{FieldChanges, FieldRole};
use cardbox_core::domain::save_op::{OperationKind, SaveOperation};
use cardbox_core::ports::record_store::RecordStore;
use chrono::Utc;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::SaveError;

/// What the preparer decided to do with an operation
#[derive(Debug, Clone, PartialEq)]
pub enum PreparedSave {
    /// Perform a remote write with these field changes
    Write(FieldChanges),
    /// Nothing but the timestamp would change; skip the network write and
    /// report a synthetic success
    Skip,
}

/// Prepares field changes for the save queue
pub struct SaveDataPreparer {
    store: Arc<dyn RecordStore>,
    preservation: PreservationPolicy,
}

impl SaveDataPreparer {
    pub fn new(store: Arc<dyn RecordStore>, preservation: PreservationPolicy) -> Self {
        Self {
            store,
            preservation,
        }
    }

    /// Computes the field changes for one operation
    ///
    /// # Errors
    /// - [`SaveError::Validation`] when the operation's payload shape does
    ///   not match its kind
    /// - [`SaveError::PreservationFetch`] when the pre-save fetch fails and
    ///   the preservation policy is strict
    pub async fn prepare(&self, operation: &SaveOperation) -> Result<PreparedSave, SaveError> {
        operation.validate()?;

        let mut changes = FieldChanges::with_timestamp(Utc::now());
        match operation.kind {
            OperationKind::Full => self.collect_full(operation, &mut changes),
            OperationKind::TopicLists => self.collect_topic_lists(operation, &mut changes),
        }

        if operation.preserve_fields {
            self.preserve(operation, &mut changes).await?;
        }

        if changes.is_timestamp_only() {
            debug!(
                record_id = %operation.record_id,
                kind = %operation.kind,
                "Nothing to write beyond the timestamp, skipping remote call"
            );
            return Ok(PreparedSave::Skip);
        }

        Ok(PreparedSave::Write(changes))
    }

    /// Full save: serialize every payload section that is present
    fn collect_full(&self, operation: &SaveOperation, changes: &mut FieldChanges) {
        let payload = &operation.payload;

        if let Some(cards) = &payload.cards {
            changes.set(FieldRole::CardBank, json!(cards));
        }
        if let Some(mapping) = &payload.color_mapping {
            changes.set(FieldRole::ColorMapping, json!(mapping));
        }
        if let Some(boxes) = &payload.spaced_repetition {
            for num in BoxNumber::all() {
                changes.set(FieldRole::for_box(num), json!(boxes.get(num)));
            }
        }
        if let Some(metadata) = &payload.topic_metadata {
            changes.set(FieldRole::TopicMetadata, metadata.clone());
        }
        if let Some(lists) = &payload.topic_lists {
            changes.set(FieldRole::TopicLists, json!(lists));
        }
    }

    /// Topic-list save: only the topic-list field
    fn collect_topic_lists(&self, operation: &SaveOperation, changes: &mut FieldChanges) {
        if let Some(lists) = &operation.payload.topic_lists {
            changes.set(FieldRole::TopicLists, json!(lists));
        }
    }

    /// Fetches the current remote record and carries forward untouched
    /// fields; fetch failure behavior is governed by the preservation
    /// policy
    async fn preserve(
        &self,
        operation: &SaveOperation,
        changes: &mut FieldChanges,
    ) -> Result<(), SaveError> {
        match self.store.fetch(&operation.record_id).await {
            Ok(remote) => {
                let carried = changes.preserve_from(&remote);
                debug!(
                    record_id = %operation.record_id,
                    carried = carried.len(),
                    "Preserved untouched remote fields"
                );
                Ok(())
            }
            Err(err) => match self.preservation {
                PreservationPolicy::BestEffort => {
                    warn!(
                        record_id = %operation.record_id,
                        error = %format!("{err:#}"),
                        "Preservation fetch failed, proceeding without preservation \
                         (data loss risk)"
                    );
                    Ok(())
                }
                PreservationPolicy::Strict => {
                    Err(SaveError::PreservationFetch(format!("{err:#}")))
                }
            },
        }
    }
}

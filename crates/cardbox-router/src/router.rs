//! Request dispatch
//!
//! Stateless dispatch table keyed by request type. Each handler validates
//! its required fields, performs the business logic (usually: fetch the
//! existing record, compute new field values, enqueue a save), and always
//! produces exactly one response. Failures carry a human-readable error
//! string; nothing here panics or leaves a request unanswered.

use std::collections::HashSet;
use std::sync::Arc;

use cardbox_bank::{
    assign_cards_to_shells, dedupe_cards, merge_shells, rebuild_bank, split_by_kind,
    verify_bank, BankPartition,
};
use cardbox_color::ColorAssignmentEngine;
use cardbox_core::domain::boxes::{BoxEntry, BoxSet};
use cardbox_core::domain::card::{Flashcard, TopicShell};
use cardbox_core::domain::color_map::ColorMapping;
use cardbox_core::domain::newtypes::{BoxNumber, ItemId, RecordId};
use cardbox_core::domain::record::FieldRole;
use cardbox_core::domain::save_op::{OperationKind, SaveOperation, SavePayload};
use cardbox_core::domain::topic::TopicList;
use cardbox_core::ports::auth::AccessTokenProvider;
use cardbox_core::ports::record_store::RecordStore;
use cardbox_sync::{SaveError, SaveOutcome, SaveQueue};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::messages::{Request, Response};

/// Everything a handler needs from the current remote record
struct Snapshot {
    bank: BankPartition,
    mapping: ColorMapping,
    boxes: BoxSet,
}

/// Dispatches cross-context requests to the synchronization engine
pub struct MessageRouter {
    queue: SaveQueue,
    store: Arc<dyn RecordStore>,
    tokens: Arc<dyn AccessTokenProvider>,
    colors: ColorAssignmentEngine,
    /// The session's record id, answered to `REQUEST_RECORD_ID`
    session_record_id: Option<RecordId>,
}

impl MessageRouter {
    pub fn new(
        queue: SaveQueue,
        store: Arc<dyn RecordStore>,
        tokens: Arc<dyn AccessTokenProvider>,
        session_record_id: Option<RecordId>,
    ) -> Self {
        Self {
            queue,
            store,
            tokens,
            colors: ColorAssignmentEngine::new(),
            session_record_id,
        }
    }

    /// Handles one request, always producing exactly one response
    pub async fn handle(&self, request: Request) -> Response {
        debug!(request = ?request_tag(&request), "Dispatching request");
        match request {
            Request::SaveData {
                record_id,
                data,
                preserve_fields,
            } => self.handle_save_data(record_id, data, preserve_fields).await,
            Request::AddToBank { record_id, cards } => {
                self.handle_add_to_bank(record_id, cards).await
            }
            Request::TopicListsUpdated {
                record_id,
                topic_lists,
            } => self.handle_topic_lists(record_id, topic_lists).await,
            Request::DeleteSubject { record_id, subject } => {
                self.handle_delete_subject(record_id, subject).await
            }
            Request::DeleteTopic {
                record_id,
                subject,
                topic,
            } => self.handle_delete_topic(record_id, subject, topic).await,
            Request::RequestUpdatedData { record_id } | Request::ReloadAppData { record_id } => {
                self.handle_request_data(record_id).await
            }
            Request::RequestRecordId => self.handle_request_record_id(),
            Request::TokenRefresh => self.handle_token_refresh().await,
        }
    }

    // ========================================================================
    // SAVE_DATA
    // ========================================================================

    async fn handle_save_data(
        &self,
        record_id: String,
        data: SavePayload,
        preserve_fields: Option<bool>,
    ) -> Response {
        let record_id = match parse_record_id(&record_id) {
            Ok(id) => id,
            Err(error) => {
                return Response::SaveResult {
                    success: false,
                    timestamp: None,
                    error: Some(error),
                }
            }
        };

        let operation = SaveOperation::new(OperationKind::Full, record_id, data)
            .with_preserve_fields(preserve_fields.unwrap_or(false));

        match self.run_save(operation).await {
            Ok(outcome) => Response::SaveResult {
                success: true,
                timestamp: Some(outcome.saved_at),
                error: None,
            },
            Err(err) => Response::SaveResult {
                success: false,
                timestamp: None,
                error: Some(err.to_string()),
            },
        }
    }

    // ========================================================================
    // ADD_TO_BANK
    // ========================================================================

    async fn handle_add_to_bank(&self, record_id: String, cards: Vec<Flashcard>) -> Response {
        let record_id = match parse_record_id(&record_id) {
            Ok(id) => id,
            Err(error) => {
                return Response::AddToBankResult {
                    success: false,
                    should_reload: false,
                    error: Some(error),
                }
            }
        };

        let snapshot = match self.fetch_snapshot(&record_id).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                return Response::AddToBankResult {
                    success: false,
                    should_reload: false,
                    error: Some(format!("{err:#}")),
                }
            }
        };

        let BankPartition {
            mut shells,
            cards: mut existing_cards,
            rejected,
        } = snapshot.bank;
        if !rejected.is_empty() {
            warn!(
                rejected = rejected.len(),
                "Card bank contains unclassifiable items; they are excluded from the merge"
            );
        }

        let outcome = dedupe_cards(&existing_cards, cards);
        if outcome.added.is_empty() {
            info!(skipped = outcome.skipped, "No net-new cards to add");
            // Still run an empty save through the queue: the preparer
            // detects the timestamp-only change and skips the remote call.
            let operation =
                SaveOperation::new(OperationKind::Full, record_id, SavePayload::default())
                    .with_preserve_fields(true);
            return match self.run_save(operation).await {
                Ok(_) => Response::AddToBankResult {
                    success: true,
                    should_reload: false,
                    error: None,
                },
                Err(err) => Response::AddToBankResult {
                    success: false,
                    should_reload: false,
                    error: Some(err.to_string()),
                },
            };
        }

        // Enroll the new cards: bank membership, box 1, subject colors.
        let now = Utc::now();
        let mut boxes = snapshot.boxes;
        let mut new_subjects: Vec<String> = Vec::new();
        for card in &outcome.added {
            boxes.enroll_new_card(card.id.clone(), now);
            if !new_subjects.contains(&card.subject) {
                new_subjects.push(card.subject.clone());
            }
        }
        let mapping = self
            .colors
            .assign_subject_colors(snapshot.mapping, &new_subjects);

        existing_cards.extend(outcome.added);
        assign_cards_to_shells(&mut shells, &existing_cards);
        let report = verify_bank(&shells, &mut existing_cards);
        if !report.is_clean() {
            info!(?report, "Integrity repairs applied while adding cards");
        }

        let payload = SavePayload {
            cards: Some(rebuild_bank(shells, existing_cards)),
            color_mapping: Some(mapping),
            spaced_repetition: Some(boxes),
            ..SavePayload::default()
        };
        let operation = SaveOperation::new(OperationKind::Full, record_id, payload)
            .with_preserve_fields(true);

        match self.run_save(operation).await {
            Ok(_) => Response::AddToBankResult {
                success: true,
                should_reload: true,
                error: None,
            },
            Err(err) => Response::AddToBankResult {
                success: false,
                should_reload: false,
                error: Some(err.to_string()),
            },
        }
    }

    // ========================================================================
    // TOPIC_LISTS_UPDATED
    // ========================================================================

    async fn handle_topic_lists(&self, record_id: String, topic_lists: Vec<TopicList>) -> Response {
        let record_id = match parse_record_id(&record_id) {
            Ok(id) => id,
            Err(error) => {
                return Response::TopicListsUpdateResult {
                    success: false,
                    timestamp: None,
                    error: Some(error),
                }
            }
        };

        let snapshot = match self.fetch_snapshot(&record_id).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                return Response::TopicListsUpdateResult {
                    success: false,
                    timestamp: None,
                    error: Some(format!("{err:#}")),
                }
            }
        };

        let subjects: Vec<String> = topic_lists.iter().map(|l| l.subject.clone()).collect();
        let mut mapping = self.colors.assign_subject_colors(snapshot.mapping, &subjects);

        // Regenerate shells from the lists, deriving one shade per topic.
        let mut incoming: Vec<TopicShell> = Vec::new();
        for list in &topic_lists {
            let base = mapping
                .get(&list.subject)
                .map(|c| c.base.clone())
                .unwrap_or_else(|| self.colors.placeholder());
            let shades = self
                .colors
                .generate_shade_variations(&base, list.topics.len());

            for (entry, shade) in list.topics.iter().zip(shades) {
                let id = entry.id.clone().unwrap_or_else(ItemId::generate);
                let mut shell = TopicShell::new(id, list.subject.clone(), entry.name.clone());
                shell.exam_board = list.exam_board.clone();
                shell.exam_type = list.exam_type.clone();
                shell.base_color = Some(base.clone());
                shell.topic_color = Some(shade.clone());
                mapping.set_topic_shade(&list.subject, entry.name.clone(), shade);
                incoming.push(shell);
            }
        }

        let mut shells = merge_shells(snapshot.bank.shells, incoming);

        // Shells that still have no cards after the merge are greyed out.
        for shell in &mut shells {
            if shell.is_empty {
                let current = shell
                    .topic_color
                    .clone()
                    .or_else(|| shell.base_color.clone())
                    .unwrap_or_else(|| self.colors.placeholder());
                shell.topic_color = Some(self.colors.grey_out(&current));
            }
        }

        // Two queued writes, FIFO: the raw lists first, then the shells and
        // colors derived from them.
        let lists_op = SaveOperation::new(
            OperationKind::TopicLists,
            record_id.clone(),
            SavePayload {
                topic_lists: Some(topic_lists),
                ..SavePayload::default()
            },
        )
        .with_preserve_fields(true);

        let bank_op = SaveOperation::new(
            OperationKind::Full,
            record_id,
            SavePayload {
                cards: Some(rebuild_bank(shells, snapshot.bank.cards)),
                color_mapping: Some(mapping),
                ..SavePayload::default()
            },
        )
        .with_preserve_fields(true);

        let lists_ticket = match self.queue.enqueue(lists_op).await {
            Ok(ticket) => ticket,
            Err(err) => {
                return Response::TopicListsUpdateResult {
                    success: false,
                    timestamp: None,
                    error: Some(err.to_string()),
                }
            }
        };
        let bank_result = self.run_save(bank_op).await;
        let lists_result = lists_ticket.wait().await;

        match (lists_result, bank_result) {
            (Ok(_), Ok(outcome)) => Response::TopicListsUpdateResult {
                success: true,
                timestamp: Some(outcome.saved_at),
                error: None,
            },
            (Err(err), _) | (_, Err(err)) => Response::TopicListsUpdateResult {
                success: false,
                timestamp: None,
                error: Some(err.to_string()),
            },
        }
    }

    // ========================================================================
    // DELETE_SUBJECT / DELETE_TOPIC
    // ========================================================================

    async fn handle_delete_subject(&self, record_id: String, subject: String) -> Response {
        let record_id = match parse_record_id(&record_id) {
            Ok(id) => id,
            Err(error) => {
                return Response::DeleteSubjectResult {
                    success: false,
                    subject,
                    error: Some(error),
                }
            }
        };

        let snapshot = match self.fetch_snapshot(&record_id).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                return Response::DeleteSubjectResult {
                    success: false,
                    subject,
                    error: Some(format!("{err:#}")),
                }
            }
        };

        let mut shells = snapshot.bank.shells;
        let mut cards = snapshot.bank.cards;
        let before = shells.len() + cards.len();
        shells.retain(|s| s.subject != subject);
        cards.retain(|c| c.subject != subject);
        info!(
            subject = %subject,
            removed = before - shells.len() - cards.len(),
            "Deleting subject from card bank"
        );

        let mut mapping = snapshot.mapping;
        mapping.remove_subject(&subject);

        let mut boxes = snapshot.boxes;
        let remaining: HashSet<ItemId> = cards.iter().map(|c| c.id.clone()).collect();
        let purged = boxes.purge_missing(&remaining);
        if purged > 0 {
            debug!(purged, "Purged dangling box entries after subject deletion");
        }

        let payload = SavePayload {
            cards: Some(rebuild_bank(shells, cards)),
            color_mapping: Some(mapping),
            spaced_repetition: Some(boxes),
            ..SavePayload::default()
        };
        let operation = SaveOperation::new(OperationKind::Full, record_id, payload)
            .with_preserve_fields(true);

        match self.run_save(operation).await {
            Ok(_) => Response::DeleteSubjectResult {
                success: true,
                subject,
                error: None,
            },
            Err(err) => Response::DeleteSubjectResult {
                success: false,
                subject,
                error: Some(err.to_string()),
            },
        }
    }

    async fn handle_delete_topic(
        &self,
        record_id: String,
        subject: String,
        topic: String,
    ) -> Response {
        let record_id = match parse_record_id(&record_id) {
            Ok(id) => id,
            Err(error) => {
                return Response::DeleteTopicResult {
                    success: false,
                    subject,
                    topic,
                    error: Some(error),
                }
            }
        };

        let snapshot = match self.fetch_snapshot(&record_id).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                return Response::DeleteTopicResult {
                    success: false,
                    subject,
                    topic,
                    error: Some(format!("{err:#}")),
                }
            }
        };

        let mut shells = snapshot.bank.shells;
        let mut cards = snapshot.bank.cards;
        shells.retain(|s| !(s.subject == subject && s.name == topic));
        cards.retain(|c| !(c.subject == subject && c.topic == topic));

        // Remaining shells must not reference the deleted cards.
        let remaining: HashSet<ItemId> = cards.iter().map(|c| c.id.clone()).collect();
        for shell in &mut shells {
            shell.cards.retain(|id| remaining.contains(id));
            shell.refresh_is_empty();
        }

        let mut mapping = snapshot.mapping;
        if let Some(entry) = mapping.subjects.get_mut(&subject) {
            entry.topics.remove(&topic);
        }

        let mut boxes = snapshot.boxes;
        boxes.purge_missing(&remaining);

        info!(subject = %subject, topic = %topic, "Deleting topic from card bank");

        let payload = SavePayload {
            cards: Some(rebuild_bank(shells, cards)),
            color_mapping: Some(mapping),
            spaced_repetition: Some(boxes),
            ..SavePayload::default()
        };
        let operation = SaveOperation::new(OperationKind::Full, record_id, payload)
            .with_preserve_fields(true);

        match self.run_save(operation).await {
            Ok(_) => Response::DeleteTopicResult {
                success: true,
                subject,
                topic,
                error: None,
            },
            Err(err) => Response::DeleteTopicResult {
                success: false,
                subject,
                topic,
                error: Some(err.to_string()),
            },
        }
    }

    // ========================================================================
    // REQUEST_UPDATED_DATA / RELOAD_APP_DATA
    // ========================================================================

    async fn handle_request_data(&self, record_id: String) -> Response {
        let record_id = match parse_record_id(&record_id) {
            Ok(id) => id,
            Err(error) => return Response::DataRefreshError { error },
        };

        let record = match self.store.fetch(&record_id).await {
            Ok(record) => record,
            Err(err) => {
                return Response::DataRefreshError {
                    error: format!("{err:#}"),
                }
            }
        };

        let field_or = |role: FieldRole, default: Value| -> Value {
            record.field(role).cloned().unwrap_or(default)
        };

        Response::RecordData {
            record_id: record_id.to_string(),
            cards: field_or(FieldRole::CardBank, json!([])),
            color_mapping: field_or(FieldRole::ColorMapping, json!({})),
            topic_lists: field_or(FieldRole::TopicLists, json!([])),
            spaced_repetition: json!({
                "box1": field_or(FieldRole::Box1, json!([])),
                "box2": field_or(FieldRole::Box2, json!([])),
                "box3": field_or(FieldRole::Box3, json!([])),
                "box4": field_or(FieldRole::Box4, json!([])),
                "box5": field_or(FieldRole::Box5, json!([])),
            }),
        }
    }

    // ========================================================================
    // REQUEST_RECORD_ID / TOKEN_REFRESH
    // ========================================================================

    fn handle_request_record_id(&self) -> Response {
        match &self.session_record_id {
            Some(id) => Response::RecordIdResponse {
                record_id: id.to_string(),
            },
            None => Response::RecordIdError {
                error: "No record id available for this session".to_string(),
            },
        }
    }

    async fn handle_token_refresh(&self) -> Response {
        match self.tokens.refresh().await {
            Ok(_) => Response::TokenRefreshResult {
                success: true,
                error: None,
            },
            Err(err) => Response::TokenRefreshResult {
                success: false,
                error: Some(format!("{err:#}")),
            },
        }
    }

    // ========================================================================
    // Shared plumbing
    // ========================================================================

    async fn run_save(&self, operation: SaveOperation) -> Result<SaveOutcome, SaveError> {
        self.queue.enqueue(operation).await?.wait().await
    }

    /// Fetches the record and decodes the sections handlers work with;
    /// individually malformed sections degrade to empty defaults
    async fn fetch_snapshot(&self, record_id: &RecordId) -> anyhow::Result<Snapshot> {
        let record = self.store.fetch(record_id).await?;

        let bank_items: Vec<Value> = record
            .field(FieldRole::CardBank)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let bank = split_by_kind(&bank_items);

        let mapping = record
            .field(FieldRole::ColorMapping)
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();

        let mut boxes = BoxSet::default();
        for num in BoxNumber::all() {
            let entries: Vec<BoxEntry> = record
                .field(FieldRole::for_box(num))
                .cloned()
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_default();
            *boxes.get_mut(num) = entries;
        }

        Ok(Snapshot {
            bank,
            mapping,
            boxes,
        })
    }
}

fn parse_record_id(raw: &str) -> Result<RecordId, String> {
    RecordId::new(raw).map_err(|err| err.to_string())
}

/// Short tag for dispatch logging
fn request_tag(request: &Request) -> &'static str {
    match request {
        Request::SaveData { .. } => "SAVE_DATA",
        Request::AddToBank { .. } => "ADD_TO_BANK",
        Request::TopicListsUpdated { .. } => "TOPIC_LISTS_UPDATED",
        Request::DeleteSubject { .. } => "DELETE_SUBJECT",
        Request::DeleteTopic { .. } => "DELETE_TOPIC",
        Request::RequestUpdatedData { .. } => "REQUEST_UPDATED_DATA",
        Request::ReloadAppData { .. } => "RELOAD_APP_DATA",
        Request::RequestRecordId => "REQUEST_RECORD_ID",
        Request::TokenRefresh => "TOKEN_REFRESH",
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Entity classification
//!
//! Every bank item must carry the `kind` discriminant set at creation
//! time. Items lacking it — or failing to deserialize as the kind they
//! claim — are rejected and surfaced to the caller, never guessed at from
//! field shapes.

use cardbox_core::domain::card::CardBankItem;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Why a raw bank item could not be classified
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    /// The item has no `kind` field
    #[error("Item {0} has no kind discriminant")]
    MissingDiscriminant(String),

    /// The `kind` value names no known entity kind
    #[error("Item {0} has unknown kind {1:?}")]
    UnknownKind(String, String),

    /// The item claims a kind but its payload does not deserialize as it
    #[error("Item {0} is malformed: {1}")]
    Malformed(String, String),
}

/// A bank item that failed classification, kept for reporting
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedItem {
    pub value: Value,
    pub error: ClassifyError,
}

/// The card bank split into its two entity kinds plus rejects
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BankPartition {
    pub shells: Vec<cardbox_core::domain::card::TopicShell>,
    pub cards: Vec<cardbox_core::domain::card::Flashcard>,
    pub rejected: Vec<RejectedItem>,
}

/// Best-effort id for error messages on unclassifiable items
fn item_label(value: &Value) -> String {
    value
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("<no id>")
        .to_string()
}

/// Classifies one raw bank item by its mandatory discriminant
pub fn classify(value: &Value) -> Result<CardBankItem, ClassifyError> {
    let label = item_label(value);

    let kind = match value.get("kind") {
        Some(Value::String(kind)) => kind.clone(),
        Some(_) | None => return Err(ClassifyError::MissingDiscriminant(label)),
    };

    if kind != "topic_shell" && kind != "flashcard" {
        return Err(ClassifyError::UnknownKind(label, kind));
    }

    serde_json::from_value::<CardBankItem>(value.clone())
        .map_err(|err| ClassifyError::Malformed(label, err.to_string()))
}

/// Partitions the mixed bank array into shells and cards
///
/// Rejected items are returned for integrity reporting; they are excluded
/// from merges and will not survive the next full save, which is logged.
pub fn split_by_kind(items: &[Value]) -> BankPartition {
    let mut partition = BankPartition::default();

    for value in items {
        match classify(value) {
            Ok(CardBankItem::TopicShell(shell)) => partition.shells.push(shell),
            Ok(CardBankItem::Flashcard(card)) => partition.cards.push(card),
            Err(error) => {
                warn!(%error, "Rejecting unclassifiable bank item");
                partition.rejected.push(RejectedItem {
                    value: value.clone(),
                    error,
                });
            }
        }
    }

    partition
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shell_value() -> Value {
        json!({
            "kind": "topic_shell",
            "id": "t1",
            "subject": "Biology",
            "name": "Cells",
            "cards": ["c1"],
            "isEmpty": false,
            "createdAt": "2026-01-01T00:00:00Z",
            "updatedAt": "2026-01-01T00:00:00Z"
        })
    }

    fn card_value() -> Value {
        json!({
            "kind": "flashcard",
            "id": "c1",
            "subject": "Biology",
            "topic": "Cells",
            "question": "q",
            "answer": "a",
            "questionType": "short_answer"
        })
    }

    #[test]
    fn test_classify_shell() {
        let item = classify(&shell_value()).unwrap();
        assert!(item.is_shell());
        assert_eq!(item.id().as_str(), "t1");
    }

    #[test]
    fn test_classify_card() {
        let item = classify(&card_value()).unwrap();
        assert!(!item.is_shell());
    }

    #[test]
    fn test_missing_discriminant_rejected() {
        let raw = json!({"id": "x1", "question": "q", "answer": "a"});
        assert!(matches!(
            classify(&raw),
            Err(ClassifyError::MissingDiscriminant(_))
        ));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let raw = json!({"id": "x1", "kind": "note"});
        assert!(matches!(classify(&raw), Err(ClassifyError::UnknownKind(_, _))));
    }

    #[test]
    fn test_malformed_payload_rejected() {
        // Claims to be a flashcard but has no question/answer fields.
        let raw = json!({"id": "x1", "kind": "flashcard"});
        assert!(matches!(classify(&raw), Err(ClassifyError::Malformed(_, _))));
    }

    #[test]
    fn test_split_by_kind() {
        let items = vec![
            shell_value(),
            card_value(),
            json!({"id": "bad", "untagged": true}),
        ];
        let partition = split_by_kind(&items);

        assert_eq!(partition.shells.len(), 1);
        assert_eq!(partition.cards.len(), 1);
        assert_eq!(partition.rejected.len(), 1);
        assert_eq!(
            partition.rejected[0].error,
            ClassifyError::MissingDiscriminant("bad".to_string())
        );
    }
}

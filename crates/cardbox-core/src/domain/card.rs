//! Card bank entities
//!
//! The card bank is one remote field holding a mixed array of two entity
//! kinds: [`TopicShell`] placeholders and [`Flashcard`] question/answer
//! items. Every item carries a mandatory `kind` discriminant set at
//! creation time; items without it are rejected by the classifier rather
//! than guessed at.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::{BoxNumber, ColorHex, ItemId};

// ============================================================================
// TopicShell
// ============================================================================

/// A placeholder entity representing a topic
///
/// Holds metadata and colors plus a reference list of card ids, independent
/// of whether any cards exist yet. Shell identity (`id`) and card membership
/// (`cards`) are stable across regenerations of the same logical topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicShell {
    pub id: ItemId,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_board: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_type: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_color: Option<ColorHex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_color: Option<ColorHex>,
    /// Logical membership: ids of cards belonging to this topic
    #[serde(default)]
    pub cards: Vec<ItemId>,
    /// Derived: `cards.is_empty()`, kept in sync by [`refresh_is_empty`](Self::refresh_is_empty)
    #[serde(default = "default_true")]
    pub is_empty: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl TopicShell {
    /// Creates an empty shell for a `(subject, name)` pair
    pub fn new(id: ItemId, subject: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            subject: subject.into(),
            exam_board: None,
            exam_type: None,
            name: name.into(),
            base_color: None,
            topic_color: None,
            cards: Vec::new(),
            is_empty: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Recomputes the derived `is_empty` flag from the `cards` list
    pub fn refresh_is_empty(&mut self) {
        self.is_empty = self.cards.is_empty();
    }
}

// ============================================================================
// Flashcard
// ============================================================================

/// The kind of question a flashcard asks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    ShortAnswer,
    MultipleChoice,
    Essay,
    Acronym,
    /// Unrecognized type from an older client; treated as short answer
    #[serde(other)]
    Unknown,
}

impl QuestionType {
    #[must_use]
    pub fn is_multiple_choice(&self) -> bool {
        matches!(self, QuestionType::MultipleChoice)
    }
}

/// One selectable answer on a multiple-choice card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    pub text: String,
    pub is_correct: bool,
}

/// A question/answer entity belonging to a subject/topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: ItemId,
    pub subject: String,
    pub topic: String,
    pub question: String,
    pub answer: String,
    pub question_type: QuestionType,
    /// Present only for multiple-choice cards
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<AnswerOption>>,
    #[serde(default = "BoxNumber::first")]
    pub box_num: BoxNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reviewed: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_review_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_color: Option<ColorHex>,
}

impl Flashcard {
    /// True when the card claims multiple choice but carries no options,
    /// an integrity defect repaired by the verification pass
    #[must_use]
    pub fn is_missing_options(&self) -> bool {
        self.question_type.is_multiple_choice()
            && self.options.as_ref().map_or(true, |o| o.is_empty())
    }
}

// ============================================================================
// CardBankItem
// ============================================================================

/// Tagged union over the two entity kinds stored in the card bank field
///
/// The `kind` tag is the mandatory discriminant; serialized items always
/// carry `"kind": "topic_shell"` or `"kind": "flashcard"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardBankItem {
    TopicShell(TopicShell),
    Flashcard(Flashcard),
}

impl CardBankItem {
    #[must_use]
    pub fn id(&self) -> &ItemId {
        match self {
            CardBankItem::TopicShell(s) => &s.id,
            CardBankItem::Flashcard(c) => &c.id,
        }
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        match self {
            CardBankItem::TopicShell(s) => &s.subject,
            CardBankItem::Flashcard(c) => &c.subject,
        }
    }

    #[must_use]
    pub fn is_shell(&self) -> bool {
        matches!(self, CardBankItem::TopicShell(_))
    }
}

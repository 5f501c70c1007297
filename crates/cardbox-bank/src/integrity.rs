//! Integrity verification pass
//!
//! Detects the non-fatal inconsistencies the data model tolerates but
//! flags: cards whose `(subject, topic)` matches no shell, multiple-choice
//! cards without options, and duplicate ids across the bank. Repairs are
//! applied in place where a safe repair exists; everything else becomes a
//! warning. The pass never fails a save.

use std::collections::HashSet;

use cardbox_core::domain::card::{AnswerOption, Flashcard, TopicShell};
use tracing::{info, warn};

/// Outcome of one verification pass
#[derive(Debug, Default, Clone, PartialEq)]
pub struct IntegrityReport {
    /// Cards reassigned to a shell whose name matched case-insensitively
    pub reassigned_topics: usize,
    /// Multiple-choice cards whose options were reconstructed
    pub rebuilt_options: usize,
    /// Conditions detected but not repairable
    pub warnings: Vec<String>,
}

impl IntegrityReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.reassigned_topics == 0 && self.rebuilt_options == 0 && self.warnings.is_empty()
    }
}

/// Runs the verification pass over a split bank, repairing in place
pub fn verify_bank(shells: &[TopicShell], cards: &mut [Flashcard]) -> IntegrityReport {
    let mut report = IntegrityReport::default();

    check_duplicate_ids(shells, cards, &mut report);

    for card in cards.iter_mut() {
        repair_orphan_topic(shells, card, &mut report);
        repair_missing_options(card, &mut report);
    }

    if !report.is_clean() {
        info!(
            reassigned = report.reassigned_topics,
            rebuilt = report.rebuilt_options,
            warnings = report.warnings.len(),
            "Integrity pass found issues"
        );
    }

    report
}

/// Ids must be unique across shells and cards together
fn check_duplicate_ids(shells: &[TopicShell], cards: &[Flashcard], report: &mut IntegrityReport) {
    let mut seen = HashSet::new();
    for id in shells
        .iter()
        .map(|s| &s.id)
        .chain(cards.iter().map(|c| &c.id))
    {
        if !seen.insert(id) {
            let msg = format!("Duplicate id in card bank: {id}");
            warn!(%msg);
            report.warnings.push(msg);
        }
    }
}

/// A card should match exactly one shell's `(subject, name)`; try a
/// case-insensitive same-subject match before giving up
fn repair_orphan_topic(shells: &[TopicShell], card: &mut Flashcard, report: &mut IntegrityReport) {
    let exact = shells
        .iter()
        .any(|s| s.subject == card.subject && s.name == card.topic);
    if exact {
        return;
    }

    let near = shells.iter().find(|s| {
        s.subject == card.subject && s.name.eq_ignore_ascii_case(&card.topic)
    });

    match near {
        Some(shell) => {
            info!(
                card = %card.id,
                from = %card.topic,
                to = %shell.name,
                "Reassigning card to nearest matching topic"
            );
            card.topic = shell.name.clone();
            report.reassigned_topics += 1;
        }
        None => {
            let msg = format!(
                "Card {} references missing topic {}/{}",
                card.id, card.subject, card.topic
            );
            warn!(%msg);
            report.warnings.push(msg);
        }
    }
}

/// A multiple-choice card without options gets a single correct option
/// rebuilt from its answer
fn repair_missing_options(card: &mut Flashcard, report: &mut IntegrityReport) {
    if !card.is_missing_options() {
        return;
    }

    info!(card = %card.id, "Rebuilding default options for multiple-choice card");
    card.options = Some(vec![AnswerOption {
        text: card.answer.clone(),
        is_correct: true,
    }]);
    report.rebuilt_options += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardbox_core::domain::card::QuestionType;
    use cardbox_core::domain::newtypes::{BoxNumber, ItemId};

    fn shell(shell_id: &str, subject: &str, name: &str) -> TopicShell {
        TopicShell::new(ItemId::new(shell_id).unwrap(), subject, name)
    }

    fn card(card_id: &str, subject: &str, topic: &str) -> Flashcard {
        Flashcard {
            id: ItemId::new(card_id).unwrap(),
            subject: subject.to_string(),
            topic: topic.to_string(),
            question: "q".to_string(),
            answer: "a".to_string(),
            question_type: QuestionType::ShortAnswer,
            options: None,
            box_num: BoxNumber::first(),
            last_reviewed: None,
            next_review_date: None,
            card_color: None,
        }
    }

    #[test]
    fn test_clean_bank_reports_clean() {
        let shells = vec![shell("t1", "Biology", "Cells")];
        let mut cards = vec![card("c1", "Biology", "Cells")];

        let report = verify_bank(&shells, &mut cards);
        assert!(report.is_clean());
    }

    #[test]
    fn test_case_mismatch_is_repaired() {
        let shells = vec![shell("t1", "Biology", "Cells")];
        let mut cards = vec![card("c1", "Biology", "cells")];

        let report = verify_bank(&shells, &mut cards);
        assert_eq!(report.reassigned_topics, 1);
        assert_eq!(cards[0].topic, "Cells");
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_true_orphan_is_flagged() {
        let shells = vec![shell("t1", "Biology", "Cells")];
        let mut cards = vec![card("c1", "Biology", "Genetics")];

        let report = verify_bank(&shells, &mut cards);
        assert_eq!(report.reassigned_topics, 0);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("Genetics"));
    }

    #[test]
    fn test_missing_options_rebuilt() {
        let shells = vec![shell("t1", "Biology", "Cells")];
        let mut mc = card("c1", "Biology", "Cells");
        mc.question_type = QuestionType::MultipleChoice;
        let mut cards = vec![mc];

        let report = verify_bank(&shells, &mut cards);
        assert_eq!(report.rebuilt_options, 1);

        let options = cards[0].options.as_ref().unwrap();
        assert_eq!(options.len(), 1);
        assert!(options[0].is_correct);
        assert_eq!(options[0].text, "a");
    }

    #[test]
    fn test_duplicate_ids_flagged() {
        let shells = vec![shell("x1", "Biology", "Cells")];
        let mut cards = vec![card("x1", "Biology", "Cells")];

        let report = verify_bank(&shells, &mut cards);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("Duplicate id"));
    }
}

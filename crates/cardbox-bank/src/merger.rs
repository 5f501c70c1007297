//! Card bank merging
//!
//! Shells regenerate whenever a topic list is saved, but card membership
//! and creation time belong to the existing bank; a merge takes the new
//! shell's metadata while preserving `cards` and `created_at`. Incoming
//! cards are deduplicated by id against the existing bank.

use std::collections::{HashMap, HashSet};

use cardbox_core::domain::card::{CardBankItem, Flashcard, TopicShell};
use cardbox_core::domain::newtypes::ItemId;
use chrono::Utc;
use tracing::{debug, info};

/// Result of deduplicating candidate cards against the existing bank
#[derive(Debug, Clone, PartialEq)]
pub struct DedupeOutcome {
    /// Candidates that are genuinely new
    pub added: Vec<Flashcard>,
    /// How many candidates were dropped as duplicates
    pub skipped: usize,
}

/// Merges newly generated shells into the existing shell set
///
/// For each incoming shell with a matching existing id, the merged shell
/// takes the incoming name/colors/metadata but keeps the existing `cards`
/// and `created_at`, recomputes `is_empty`, and stamps `updated_at`.
/// Incoming shells without a match are added as-is. Existing shells not
/// touched by this generation run survive unchanged, after the incoming
/// ones.
pub fn merge_shells(existing: Vec<TopicShell>, incoming: Vec<TopicShell>) -> Vec<TopicShell> {
    let mut existing_by_id: HashMap<ItemId, TopicShell> = existing
        .into_iter()
        .map(|shell| (shell.id.clone(), shell))
        .collect();

    let now = Utc::now();
    let mut merged: Vec<TopicShell> = Vec::with_capacity(incoming.len() + existing_by_id.len());

    for mut shell in incoming {
        if let Some(previous) = existing_by_id.remove(&shell.id) {
            debug!(
                id = %shell.id,
                cards = previous.cards.len(),
                "Merging regenerated shell, preserving card membership"
            );
            shell.cards = previous.cards;
            shell.created_at = previous.created_at;
            shell.refresh_is_empty();
            shell.updated_at = now;
        }
        merged.push(shell);
    }

    // Topics not touched by this generation run survive.
    let mut leftovers: Vec<TopicShell> = existing_by_id.into_values().collect();
    leftovers.sort_by(|a, b| a.id.cmp(&b.id));
    merged.extend(leftovers);

    merged
}

/// Drops candidate cards whose id already exists in the bank
pub fn dedupe_cards(existing: &[Flashcard], candidates: Vec<Flashcard>) -> DedupeOutcome {
    let known: HashSet<&ItemId> = existing.iter().map(|c| &c.id).collect();

    let total = candidates.len();
    let mut seen: HashSet<ItemId> = HashSet::new();
    let added: Vec<Flashcard> = candidates
        .into_iter()
        .filter(|card| !known.contains(&card.id) && seen.insert(card.id.clone()))
        .collect();

    let skipped = total - added.len();
    if skipped > 0 {
        info!(skipped, added = added.len(), "Skipped duplicate cards");
    }

    DedupeOutcome { added, skipped }
}

/// Appends each card's id to its owning shell's membership list
///
/// A card belongs to the shell whose `(subject, name)` equals the card's
/// `(subject, topic)`. Shells that gain their first card stop being empty.
pub fn assign_cards_to_shells(shells: &mut [TopicShell], cards: &[Flashcard]) {
    for card in cards {
        let owner = shells
            .iter_mut()
            .find(|s| s.subject == card.subject && s.name == card.topic);
        if let Some(shell) = owner {
            if !shell.cards.contains(&card.id) {
                shell.cards.push(card.id.clone());
                shell.refresh_is_empty();
            }
        }
    }
}

/// Reassembles the mixed bank array: shells first, then cards
pub fn rebuild_bank(shells: Vec<TopicShell>, cards: Vec<Flashcard>) -> Vec<CardBankItem> {
    shells
        .into_iter()
        .map(CardBankItem::TopicShell)
        .chain(cards.into_iter().map(CardBankItem::Flashcard))
        .collect()
}

//! Spaced-repetition boxes
//!
//! Five Leitner boxes, each an ordered list of review entries referencing
//! cards by id. After any deletion operation a cleanup pass removes entries
//! whose card no longer exists in the bank.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::{BoxNumber, ItemId};

/// One card's membership in a box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxEntry {
    pub card_id: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reviewed: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_review_date: Option<DateTime<Utc>>,
}

/// All five spaced-repetition boxes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxSet {
    #[serde(default)]
    pub box1: Vec<BoxEntry>,
    #[serde(default)]
    pub box2: Vec<BoxEntry>,
    #[serde(default)]
    pub box3: Vec<BoxEntry>,
    #[serde(default)]
    pub box4: Vec<BoxEntry>,
    #[serde(default)]
    pub box5: Vec<BoxEntry>,
}

impl BoxSet {
    #[must_use]
    pub fn get(&self, num: BoxNumber) -> &Vec<BoxEntry> {
        match num.get() {
            1 => &self.box1,
            2 => &self.box2,
            3 => &self.box3,
            4 => &self.box4,
            _ => &self.box5,
        }
    }

    pub fn get_mut(&mut self, num: BoxNumber) -> &mut Vec<BoxEntry> {
        match num.get() {
            1 => &mut self.box1,
            2 => &mut self.box2,
            3 => &mut self.box3,
            4 => &mut self.box4,
            _ => &mut self.box5,
        }
    }

    /// Enrolls a newly added card in box 1 with a fresh review timestamp
    ///
    /// Already-enrolled ids are left where they are; enrollment never
    /// duplicates an entry across boxes.
    pub fn enroll_new_card(&mut self, card_id: ItemId, now: DateTime<Utc>) {
        if self.contains(&card_id) {
            return;
        }
        self.box1.push(BoxEntry {
            card_id,
            last_reviewed: Some(now),
            next_review_date: Some(now),
        });
    }

    /// True if any box holds an entry for the given card
    #[must_use]
    pub fn contains(&self, card_id: &ItemId) -> bool {
        BoxNumber::all().any(|n| self.get(n).iter().any(|e| &e.card_id == card_id))
    }

    /// Removes entries whose card id is not in `existing`, returning the
    /// number of entries purged
    pub fn purge_missing(&mut self, existing: &HashSet<ItemId>) -> usize {
        let mut removed = 0;
        for num in BoxNumber::all() {
            let entries = self.get_mut(num);
            let before = entries.len();
            entries.retain(|e| existing.contains(&e.card_id));
            removed += before - entries.len();
        }
        removed
    }

    /// Total entries across all five boxes
    #[must_use]
    pub fn len(&self) -> usize {
        BoxNumber::all().map(|n| self.get(n).len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

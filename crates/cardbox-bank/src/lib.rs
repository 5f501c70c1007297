//! Cardbox Bank - Card bank reconciliation
//!
//! The card bank is one remote field holding two interleaved entity kinds:
//! topic shells and flashcards. This crate classifies raw bank items by
//! their mandatory discriminant, merges newly generated shells against the
//! existing bank without losing card membership, deduplicates incoming
//! cards, and runs the integrity verification pass that repairs or flags
//! inconsistent items.

pub mod classifier;
pub mod integrity;
pub mod merger;

pub use classifier::{classify, split_by_kind, BankPartition, ClassifyError, RejectedItem};
pub use integrity::{verify_bank, IntegrityReport};
pub use merger::{assign_cards_to_shells, dedupe_cards, merge_shells, rebuild_bank, DedupeOutcome};

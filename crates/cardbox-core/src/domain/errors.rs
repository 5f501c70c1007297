//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including validation failures and malformed identifiers.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Empty or malformed record identifier
    #[error("Invalid record id: {0}")]
    InvalidRecordId(String),

    /// Empty or malformed item identifier
    #[error("Invalid item id: {0}")]
    InvalidItemId(String),

    /// Empty subject or topic name
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Color value is not a `#rgb` / `#rrggbb` hex string
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Leitner box number outside 1..=5
    #[error("Invalid box number: {0} (expected 1-5)")]
    InvalidBoxNumber(u8),

    /// A card bank item without the mandatory `kind` discriminant
    #[error("Item has no kind discriminant: {0}")]
    MissingDiscriminant(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

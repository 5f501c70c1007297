//! Save pipeline errors and outcomes

use cardbox_core::domain::errors::DomainError;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Why a save operation failed
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SaveError {
    /// The operation was rejected before enqueueing; never retried
    #[error("Validation failed: {0}")]
    Validation(#[from] DomainError),

    /// The pre-save fetch for field preservation failed under the strict
    /// preservation policy
    #[error("Preservation fetch failed: {0}")]
    PreservationFetch(String),

    /// The remote write failed after exhausting retries
    #[error("Remote write failed: {0}")]
    Write(String),

    /// The queue was dropped before the operation completed
    #[error("Save queue shut down before the operation completed")]
    QueueClosed,
}

/// A completed save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    pub saved_at: DateTime<Utc>,
    /// False when the save was skipped as timestamp-only (synthetic success)
    pub written: bool,
}

pub type SaveResult = Result<SaveOutcome, SaveError>;

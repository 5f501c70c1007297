//! Record store port (driven/secondary port)
//!
//! Interface to the remote single-record-per-user document store. The
//! primary implementation talks HTTP with retry and codec recovery; tests
//! substitute in-memory fakes.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are
//!   adapter-specific and don't need domain-level classification.
//! - `fetch` returns fields already decoded to JSON values; the codec's
//!   staged recovery happens behind this boundary so callers never see
//!   percent-encoded or malformed field text.

use async_trait::async_trait;

use crate::domain::newtypes::RecordId;
use crate::domain::record::{FieldChanges, RemoteRecord, WriteAck};

/// Remote document store holding one record per user
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetches the record and decodes its managed fields
    async fn fetch(&self, record_id: &RecordId) -> anyhow::Result<RemoteRecord>;

    /// Writes the given field changes as a single document PUT
    async fn write(&self, record_id: &RecordId, changes: &FieldChanges)
        -> anyhow::Result<WriteAck>;
}

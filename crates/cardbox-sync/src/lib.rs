//! Cardbox Sync - Save queue and record save pipeline
//!
//! Serializes concurrent update requests into a single ordered stream of
//! remote writes. The [`SaveQueue`] guarantees FIFO completion and at most
//! one in-flight write; the [`SaveDataPreparer`] turns a logical operation
//! into concrete field changes, merging against the latest remote state
//! when field preservation is requested.

pub mod error;
pub mod preparer;
pub mod queue;
pub mod retry;

pub use error::{SaveError, SaveOutcome, SaveResult};
pub use preparer::{PreparedSave, SaveDataPreparer};
pub use queue::{SaveQueue, SaveTicket};
pub use retry::RetryPolicy;

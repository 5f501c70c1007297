//! Cardbox Remote - Record API adapter
//!
//! HTTP client for the single-record-per-user document store, plus the
//! [`RecordStore`](cardbox_core::ports::record_store::RecordStore) port
//! implementation that funnels fetched field text through the resilient
//! codec before the engine sees it.

pub mod client;
pub mod retry;
pub mod store;

pub use client::RemoteRecordClient;
pub use store::RecordApiStore;

//! Cardbox Router - Cross-context request dispatch
//!
//! The logical message bus between the UI and the synchronization engine.
//! Every inbound request is validated, dispatched to the operation it
//! names, and answered with exactly one response message - success or
//! failure, never silence.

pub mod messages;
pub mod router;

pub use messages::{Request, Response};
pub use router::MessageRouter;

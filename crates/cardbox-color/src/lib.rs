//! Cardbox Color - Palette assignment and shade derivation
//!
//! Assigns each subject a stable color from a fixed palette, derives
//! per-topic lightness variations at constant hue, and greys out topics
//! that have no cards yet. Pure computation, no I/O.

pub mod engine;
pub mod hsl;

pub use engine::{ColorAssignmentEngine, PALETTE};

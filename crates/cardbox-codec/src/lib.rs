//! Cardbox Codec - Staged recovery for remote field values
//!
//! The backend returns record fields as strings that may be percent-encoded
//! (sometimes doubly or partially), and whose JSON may be malformed in
//! recurring ways: trailing commas, doubled quotes, stray control
//! characters, truncated escapes. This crate centralizes the recovery
//! ladder so the rest of the engine only ever sees decoded JSON values.
//!
//! Recovery is never fatal: each stage is attempted in order, each fallback
//! is logged with the originating error, and only when every stage fails
//! does a field fall back to its caller-supplied default (logged as data
//! loss risk).

mod json;
mod percent;

pub use json::{parse_json, parse_json_or};
pub use percent::decode;

use serde_json::Value;
use thiserror::Error;

/// Errors surfaced when every recovery stage has failed
#[derive(Debug, Error)]
pub enum CodecError {
    /// The input could not be parsed as JSON by any recovery stage
    #[error("Unrecoverable JSON: {0}")]
    UnrecoverableJson(String),
}

/// Decodes a raw remote field to a JSON value: percent-decode stages first,
/// then JSON recovery stages, falling back to `default`.
#[must_use]
pub fn decode_field(raw: &str, default: Value) -> Value {
    let decoded = decode(raw);
    parse_json_or(&decoded, default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_field_plain_json() {
        assert_eq!(decode_field(r#"{"a":1}"#, json!(null)), json!({"a": 1}));
    }

    #[test]
    fn test_decode_field_percent_encoded() {
        assert_eq!(
            decode_field("%7B%22a%22%3A1%7D", json!(null)),
            json!({"a": 1})
        );
    }

    #[test]
    fn test_decode_field_falls_back_to_default() {
        assert_eq!(decode_field("not json at all", json!([])), json!([]));
    }
}

//! Percent-decoding with staged fallbacks
//!
//! Stage 0: input without `%` passes through unchanged.
//! Stage 1: full percent-decode.
//! Stage 2: sanitize invalid escapes (`%` not followed by two hex digits is
//!          literal-escaped to `%25`), then decode again.
//! Stage 3: salvage a balanced `[...]`/`{...}` substring and return it raw.

use percent_encoding::percent_decode_str;
use tracing::{debug, warn};

use crate::json::balanced_span;

/// Decodes a possibly percent-encoded remote field value
///
/// Never fails: the worst case returns the input unchanged so the JSON
/// recovery stages still get a chance at it.
#[must_use]
pub fn decode(raw: &str) -> String {
    if !raw.contains('%') {
        return raw.to_string();
    }

    match percent_decode_str(raw).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(err) => {
            debug!(error = %err, "Percent-decode produced invalid UTF-8, sanitizing escapes");
            decode_sanitized(raw)
        }
    }
}

/// Escapes invalid `%XX` sequences so a second decode pass can succeed
fn decode_sanitized(raw: &str) -> String {
    let sanitized = sanitize_escapes(raw);

    match percent_decode_str(&sanitized).decode_utf8() {
        Ok(decoded) => {
            debug!("Percent-decode recovered after escape sanitization");
            decoded.into_owned()
        }
        Err(err) => {
            // Give up on decoding; salvage any balanced JSON-looking span.
            warn!(
                error = %err,
                "Percent-decode failed after sanitization, salvaging balanced span"
            );
            match balanced_span(raw) {
                Some(span) => span.to_string(),
                None => raw.to_string(),
            }
        }
    }
}

/// Rewrites `%` sequences that are not two hex digits (single-digit or
/// truncated escapes) into a literal `%25` so the decoder accepts them
fn sanitize_escapes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for (i, c) in raw.char_indices() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let valid = raw
            .as_bytes()
            .get(i + 1)
            .is_some_and(u8::is_ascii_hexdigit)
            && raw
                .as_bytes()
                .get(i + 2)
                .is_some_and(u8::is_ascii_hexdigit);
        if valid {
            out.push('%');
        } else {
            out.push_str("%25");
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_without_percent() {
        assert_eq!(decode(r#"{"a":1}"#), r#"{"a":1}"#);
    }

    #[test]
    fn test_simple_decode() {
        assert_eq!(decode("%7B%22a%22%3A1%7D"), r#"{"a":1}"#);
    }

    #[test]
    fn test_decode_mixed_plain_and_encoded() {
        assert_eq!(decode("a%20b c"), "a b c");
    }

    #[test]
    fn test_truncated_escape_sanitized() {
        // A trailing "%" is not a valid escape; it must survive as a literal.
        assert_eq!(sanitize_escapes("abc%"), "abc%25");
        assert_eq!(decode("abc%"), "abc%");
    }

    #[test]
    fn test_single_digit_escape_sanitized() {
        assert_eq!(sanitize_escapes("a%2"), "a%252");
        assert_eq!(decode("a%2"), "a%2");
    }

    #[test]
    fn test_valid_escapes_untouched_by_sanitizer() {
        assert_eq!(sanitize_escapes("%7B%22"), "%7B%22");
    }

    #[test]
    fn test_invalid_utf8_salvages_braced_span() {
        // %FF decodes to a lone 0xff byte: invalid UTF-8 even after
        // sanitization, so the balanced {...} span is returned raw.
        let raw = "junk%FFjunk{\"a\":1}";
        assert_eq!(decode(raw), "{\"a\":1}");
    }
}

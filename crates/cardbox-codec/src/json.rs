//! Staged JSON recovery
//!
//! Stage 1: direct parse.
//! Stage 2: cleanup pass — strip BOM and surrounding whitespace, un-escape
//!          doubled quotes, drop trailing commas and control characters.
//! Stage 3: extract the first balanced `{...}`/`[...]` span and parse that.
//! Stage 4: caller-supplied default (logged as data loss risk).

use serde_json::Value;
use tracing::{debug, warn};

use crate::CodecError;

/// Parses a raw field string, applying the recovery ladder before failing
pub fn parse_json(raw: &str) -> Result<Value, CodecError> {
    let direct_err = match serde_json::from_str(raw) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };

    // Stage 2: cleanup pass.
    let cleaned = cleanup(raw);
    match serde_json::from_str(&cleaned) {
        Ok(value) => {
            debug!(error = %direct_err, "JSON recovered by cleanup pass");
            return Ok(value);
        }
        Err(err) => {
            debug!(error = %err, "JSON cleanup pass failed, trying quote repair");
        }
    }

    // Stage 2b: doubled quotes appear when a JSON string was re-quoted by
    // the backend: `{""a"":1}`. Applied after the basic cleanup so it only
    // runs on fields the cheaper repair could not fix.
    let requoted = cleaned.replace("\"\"", "\"");
    match serde_json::from_str(&requoted) {
        Ok(value) => {
            debug!(error = %direct_err, "JSON recovered by doubled-quote repair");
            return Ok(value);
        }
        Err(err) => {
            debug!(error = %err, "Quote repair failed, trying balanced span");
        }
    }

    // Stage 3: balanced span extraction over the cleaned text.
    if let Some(span) = balanced_span(&cleaned) {
        if let Ok(value) = serde_json::from_str::<Value>(span) {
            warn!(
                error = %direct_err,
                "JSON recovered from balanced span inside malformed field"
            );
            return Ok(value);
        }
    }

    Err(CodecError::UnrecoverableJson(direct_err.to_string()))
}

/// Parses a raw field string, falling back to `default` when every
/// recovery stage fails
#[must_use]
pub fn parse_json_or(raw: &str, default: Value) -> Value {
    match parse_json(raw) {
        Ok(value) => value,
        Err(err) => {
            warn!(
                error = %err,
                "Field unrecoverable, using default (data loss risk)"
            );
            default
        }
    }
}

/// The cleanup pass: BOM/whitespace, trailing commas, control characters
///
/// String-aware: commas inside string literals are never treated as
/// trailing, and only raw control characters (which JSON forbids inside
/// strings anyway) are dropped there.
fn cleanup(raw: &str) -> String {
    let trimmed = raw.trim_start_matches('\u{feff}').trim();
    let chars: Vec<char> = trimmed.chars().collect();

    let mut out = String::with_capacity(trimmed.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            if c.is_control() {
                continue;
            }
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                // Drop a comma that directly precedes a closing bracket.
                let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
                if matches!(next, Some('}') | Some(']')) {
                    continue;
                }
                out.push(c);
            }
            c if c.is_control() && c != '\t' && c != '\n' && c != '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Finds the first balanced `{...}` or `[...]` span in the input
///
/// Bracket counting ignores brackets inside string literals. Returns `None`
/// when no opener exists or the span never closes.
pub(crate) fn balanced_span(raw: &str) -> Option<&str> {
    let start = raw.find(['{', '['])?;
    let opener = raw.as_bytes()[start];
    let closer = if opener == b'{' { b'}' } else { b']' };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, b) in raw.bytes().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            _ if b == opener => depth += 1,
            _ if b == closer => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..=offset]);
                }
            }
            _ => {}
        }
    }

    None
}

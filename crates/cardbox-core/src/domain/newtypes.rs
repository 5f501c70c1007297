//! Domain newtypes with validation
//!
//! Strongly-typed wrappers for domain identifiers and values. Each newtype
//! ensures data validity at construction time, so the rest of the engine
//! never handles an empty record id or a malformed color hex.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

// ============================================================================
// RecordId
// ============================================================================

/// Identifier of the single remote record holding a user's data
///
/// Record ids are opaque strings assigned by the backend document store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Create a RecordId, rejecting empty or whitespace-only input
    pub fn new(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(DomainError::InvalidRecordId(raw));
        }
        Ok(Self(raw))
    }

    /// The raw string form used in API paths
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ============================================================================
// ItemId
// ============================================================================

/// Identifier of a card bank item (topic shell or flashcard)
///
/// Shells and cards share one id space; uniqueness across the whole bank is
/// an invariant enforced by the merge and dedupe passes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create an ItemId, rejecting empty input
    pub fn new(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(DomainError::InvalidItemId(raw));
        }
        Ok(Self(raw))
    }

    /// Generate a fresh random id for locally created items
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ============================================================================
// ColorHex
// ============================================================================

/// A `#rgb` or `#rrggbb` hex color value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorHex(String);

impl ColorHex {
    /// Create a ColorHex, validating the `#rgb` / `#rrggbb` shape
    pub fn new(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        let hex = match raw.strip_prefix('#') {
            Some(h) => h,
            None => return Err(DomainError::InvalidColor(raw)),
        };
        if !(hex.len() == 3 || hex.len() == 6) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::InvalidColor(raw));
        }
        Ok(Self(raw.to_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ColorHex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ColorHex {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ============================================================================
// BoxNumber
// ============================================================================

/// One of the five Leitner boxes (1 = newest, 5 = most retained)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoxNumber(u8);

impl BoxNumber {
    /// Create a BoxNumber, rejecting values outside 1..=5
    pub fn new(n: u8) -> Result<Self, DomainError> {
        if (1..=5).contains(&n) {
            Ok(Self(n))
        } else {
            Err(DomainError::InvalidBoxNumber(n))
        }
    }

    /// Box 1, where newly added cards are enrolled
    #[must_use]
    pub const fn first() -> Self {
        Self(1)
    }

    #[must_use]
    pub fn get(&self) -> u8 {
        self.0
    }

    /// Zero-based index into a five-element box array
    #[must_use]
    pub fn index(&self) -> usize {
        (self.0 - 1) as usize
    }

    /// All five boxes in order
    pub fn all() -> impl Iterator<Item = BoxNumber> {
        (1..=5).map(BoxNumber)
    }
}

impl Display for BoxNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_rejects_empty() {
        assert!(RecordId::new("").is_err());
        assert!(RecordId::new("   ").is_err());
        assert!(RecordId::new("rec-1").is_ok());
    }

    #[test]
    fn test_record_id_roundtrip() {
        let id: RecordId = "5f8a1b2c".parse().unwrap();
        assert_eq!(id.as_str(), "5f8a1b2c");
        assert_eq!(id.to_string(), "5f8a1b2c");
    }

    #[test]
    fn test_item_id_generate_unique() {
        let a = ItemId::generate();
        let b = ItemId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_color_hex_valid() {
        assert!(ColorHex::new("#4363d8").is_ok());
        assert!(ColorHex::new("#fff").is_ok());
        assert_eq!(ColorHex::new("#ABCDEF").unwrap().as_str(), "#abcdef");
    }

    #[test]
    fn test_color_hex_invalid() {
        assert!(ColorHex::new("4363d8").is_err());
        assert!(ColorHex::new("#12345").is_err());
        assert!(ColorHex::new("#gggggg").is_err());
        assert!(ColorHex::new("").is_err());
    }

    #[test]
    fn test_box_number_bounds() {
        assert!(BoxNumber::new(0).is_err());
        assert!(BoxNumber::new(6).is_err());
        for n in 1..=5 {
            assert_eq!(BoxNumber::new(n).unwrap().get(), n);
        }
    }

    #[test]
    fn test_box_number_index() {
        assert_eq!(BoxNumber::first().index(), 0);
        assert_eq!(BoxNumber::new(5).unwrap().index(), 4);
    }

    #[test]
    fn test_serde_transparent() {
        let id = RecordId::new("r1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"r1\"");

        let color: ColorHex = serde_json::from_str("\"#4363d8\"").unwrap();
        assert_eq!(color.as_str(), "#4363d8");
    }
}

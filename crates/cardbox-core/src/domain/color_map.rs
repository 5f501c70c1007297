//! Subject color mapping
//!
//! Maps each subject to a base palette color and per-topic shade
//! variations. Every subject referenced by any topic shell must have an
//! entry; the assignment engine replaces neutral placeholders with real
//! palette colors once data exists.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::newtypes::ColorHex;

/// The neutral placeholder used before a subject has a real palette color
pub const NEUTRAL_PLACEHOLDER: &str = "#e0e0e0";

/// Colors stored for one subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectColors {
    /// The subject's palette color
    pub base: ColorHex,
    /// Shade variation per topic name
    #[serde(default)]
    pub topics: BTreeMap<String, ColorHex>,
}

impl SubjectColors {
    pub fn new(base: ColorHex) -> Self {
        Self {
            base,
            topics: BTreeMap::new(),
        }
    }

    /// True while the base color is still the neutral placeholder
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.base.as_str() == NEUTRAL_PLACEHOLDER
    }
}

/// Map from subject name to its colors
///
/// Serialized as a plain JSON object keyed by subject, the shape the
/// remote `colorMapping` field stores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorMapping {
    pub subjects: BTreeMap<String, SubjectColors>,
}

impl ColorMapping {
    #[must_use]
    pub fn get(&self, subject: &str) -> Option<&SubjectColors> {
        self.subjects.get(subject)
    }

    pub fn insert(&mut self, subject: impl Into<String>, colors: SubjectColors) {
        self.subjects.insert(subject.into(), colors);
    }

    /// Removes a subject's entry entirely (subject deletion cascade)
    pub fn remove_subject(&mut self, subject: &str) -> Option<SubjectColors> {
        self.subjects.remove(subject)
    }

    pub fn set_topic_shade(&mut self, subject: &str, topic: impl Into<String>, shade: ColorHex) {
        if let Some(entry) = self.subjects.get_mut(subject) {
            entry.topics.insert(topic.into(), shade);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_detection() {
        let entry = SubjectColors::new(ColorHex::new(NEUTRAL_PLACEHOLDER).unwrap());
        assert!(entry.is_placeholder());

        let entry = SubjectColors::new(ColorHex::new("#4363d8").unwrap());
        assert!(!entry.is_placeholder());
    }

    #[test]
    fn test_remove_subject() {
        let mut mapping = ColorMapping::default();
        mapping.insert(
            "Biology",
            SubjectColors::new(ColorHex::new("#4363d8").unwrap()),
        );
        assert!(mapping.get("Biology").is_some());

        mapping.remove_subject("Biology");
        assert!(mapping.get("Biology").is_none());
    }

    #[test]
    fn test_wire_shape_is_plain_object() {
        let mut mapping = ColorMapping::default();
        let mut colors = SubjectColors::new(ColorHex::new("#4363d8").unwrap());
        colors
            .topics
            .insert("Algebra".to_string(), ColorHex::new("#6e86e0").unwrap());
        mapping.insert("Maths", colors);

        let json = serde_json::to_value(&mapping).unwrap();
        assert_eq!(json["Maths"]["base"], "#4363d8");
        assert_eq!(json["Maths"]["topics"]["Algebra"], "#6e86e0");
    }

    #[test]
    fn test_set_topic_shade_missing_subject_is_noop() {
        let mut mapping = ColorMapping::default();
        mapping.set_topic_shade("Ghost", "Topic", ColorHex::new("#fff").unwrap());
        assert!(mapping.is_empty());
    }
}

//! Topic list structures
//!
//! A topic list is the user-curated outline for one subject: exam context
//! plus named topics. Topic-list saves regenerate topic shells in the card
//! bank while preserving each shell's card membership.

use serde::{Deserialize, Serialize};

use super::newtypes::ItemId;

/// One topic inside a topic list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicEntry {
    /// Stable id, carried across regenerations; absent for brand-new topics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    pub name: String,
}

/// The curated topic outline for one subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicList {
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_board: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_type: Option<String>,
    #[serde(default)]
    pub topics: Vec<TopicEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_list_parse() {
        let raw = serde_json::json!({
            "subject": "Chemistry",
            "examBoard": "AQA",
            "examType": "GCSE",
            "topics": [
                {"id": "t1", "name": "Atomic Structure"},
                {"name": "Bonding"}
            ]
        });
        let list: TopicList = serde_json::from_value(raw).unwrap();
        assert_eq!(list.topics.len(), 2);
        assert_eq!(list.topics[0].id.as_ref().unwrap().as_str(), "t1");
        assert!(list.topics[1].id.is_none());
    }

    #[test]
    fn test_topics_default_empty() {
        let list: TopicList = serde_json::from_value(serde_json::json!({
            "subject": "Physics"
        }))
        .unwrap();
        assert!(list.topics.is_empty());
        assert!(list.exam_board.is_none());
    }
}

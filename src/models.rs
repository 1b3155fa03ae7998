//! Core data models shared by the backend client, the view state and the
//! renderer.
//!
//! These types mirror the two payloads the news backend produces: the
//! grouping of documents by an attribute, and the ordered list of summary
//! blocks for one group.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Document attribute used to partition the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GroupField {
    #[default]
    #[serde(rename = "source")]
    Source,
    #[serde(rename = "publishedAt")]
    PublishedAt,
    #[serde(rename = "unknown")]
    Unknown,
}

impl GroupField {
    /// Every field, in selector order.
    pub const ALL: [GroupField; 3] = [
        GroupField::Source,
        GroupField::PublishedAt,
        GroupField::Unknown,
    ];

    /// Wire name sent as the `field` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupField::Source => "source",
            GroupField::PublishedAt => "publishedAt",
            GroupField::Unknown => "unknown",
        }
    }

    /// Human-readable label for selectors and headers.
    pub fn label(&self) -> &'static str {
        match self {
            GroupField::Source => "Source",
            GroupField::PublishedAt => "Published Date",
            GroupField::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for GroupField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "source" => Ok(GroupField::Source),
            "publishedat" | "published-at" | "published_at" => Ok(GroupField::PublishedAt),
            "unknown" => Ok(GroupField::Unknown),
            other => Err(format!(
                "unknown group field '{}': must be source, publishedAt, or unknown",
                other
            )),
        }
    }
}

/// Identifier of one document inside a group.
///
/// The backend currently sends positional integers; string ids are accepted
/// as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentId {
    Number(i64),
    Text(String),
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentId::Number(n) => write!(f, "{}", n),
            DocumentId::Text(s) => f.write_str(s),
        }
    }
}

/// One group: its key and member documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub key: String,
    pub documents: Vec<DocumentId>,
}

/// Mapping from group key to member document ids, in the order the server
/// sent the keys.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupingResult {
    groups: Vec<Group>,
}

impl GroupingResult {
    pub fn new(groups: Vec<Group>) -> Self {
        Self { groups }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    pub fn get(&self, key: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.key == key)
    }

    /// Group at a display position.
    pub fn nth(&self, index: usize) -> Option<&Group> {
        self.groups.get(index)
    }
}

impl<'de> Deserialize<'de> for GroupingResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct GroupsVisitor;

        impl<'de> Visitor<'de> for GroupsVisitor {
            type Value = GroupingResult;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of group key to document ids")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut groups: Vec<Group> = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, documents)) = map.next_entry::<String, Vec<DocumentId>>()? {
                    // A repeated key keeps its first position and its last value.
                    match groups.iter_mut().find(|g| g.key == key) {
                        Some(existing) => existing.documents = documents,
                        None => groups.push(Group { key, documents }),
                    }
                }
                Ok(GroupingResult { groups })
            }
        }

        deserializer.deserialize_map(GroupsVisitor)
    }
}

/// Stable identity of a summary block, derived from its content.
///
/// SHA-256 of the text plus the ordinal among identical texts, so two equal
/// blocks in one summary still toggle independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey(String);

impl ItemKey {
    pub fn for_text(text: &str, occurrence: usize) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        Self(format!("{}:{}", hex::encode(hasher.finalize()), occurrence))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough to tell cards apart in logs.
        f.write_str(&self.0[..12.min(self.0.len())])
    }
}

/// One generated summary block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryItem {
    pub key: ItemKey,
    pub text: String,
}

/// Ordered summary blocks; display order is list order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SummaryResult {
    items: Vec<SummaryItem>,
}

impl SummaryResult {
    pub fn from_texts(texts: Vec<String>) -> Self {
        let mut seen: HashMap<String, usize> = HashMap::new();
        let items = texts
            .into_iter()
            .map(|text| {
                let occurrence = seen.entry(text.clone()).or_insert(0);
                let key = ItemKey::for_text(&text, *occurrence);
                *occurrence += 1;
                SummaryItem { key, text }
            })
            .collect();
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SummaryItem> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&SummaryItem> {
        self.items.get(index)
    }

    pub fn contains_key(&self, key: &ItemKey) -> bool {
        self.items.iter().any(|item| &item.key == key)
    }
}

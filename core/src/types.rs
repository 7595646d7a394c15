//! Domain DTOs for the item store API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently;
//! the integration tests catch any schema drift between the two crates.
//! `ItemId` is opaque: it is assigned by the remote store and never minted
//! locally, so it wraps whatever string the server sends.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-assigned identity of an item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A single named item returned by the API.
///
/// Older backends key documents by `_id`; both spellings decode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    #[serde(alias = "_id")]
    pub id: ItemId,
    pub name: String,
}

impl Item {
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Request payload for creating a new item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateItem {
    pub name: String,
}

/// Request payload for renaming an existing item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateItem {
    pub name: String,
}

/// Trim `name` and return it, or `None` when nothing but whitespace is left.
pub fn normalized_name(name: &str) -> Option<&str> {
    let trimmed = name.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_decodes_underscore_id() {
        let item: Item = serde_json::from_str(r#"{"_id":"65a1","name":"Milk","__v":0}"#).unwrap();
        assert_eq!(item, Item::new("65a1", "Milk"));
    }

    #[test]
    fn item_encodes_plain_id() {
        let json = serde_json::to_value(Item::new("7", "Eggs")).unwrap();
        assert_eq!(json, serde_json::json!({"id": "7", "name": "Eggs"}));
    }

    #[test]
    fn normalized_name_trims_and_rejects_blank() {
        assert_eq!(normalized_name("  Buy milk "), Some("Buy milk"));
        assert_eq!(normalized_name(" \t\n"), None);
        assert_eq!(normalized_name(""), None);
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

// ---------------------------------------------------------------------------
// ItemId
// ---------------------------------------------------------------------------

/// DynamoDB caps partition key values at 2048 bytes.
const MAX_ITEM_ID_BYTES: usize = 2048;

/// A validated item identifier: a non-empty string of at most 2048 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId(String);

impl ItemId {
    /// Create a new `ItemId` after validation.
    pub fn new(s: impl Into<String>) -> Result<Self, ItemIdError> {
        let s = s.into();

        if s.is_empty() {
            return Err(ItemIdError::Empty);
        }

        if s.len() > MAX_ITEM_ID_BYTES {
            return Err(ItemIdError::TooLong(s.len()));
        }

        Ok(Self(s))
    }

    /// A fresh random identifier for a newly created item.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl TryFrom<String> for ItemId {
    type Error = ItemIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur when validating an item id.
#[derive(Debug, Clone, Error)]
pub enum ItemIdError {
    #[error("item id must not be empty")]
    Empty,

    #[error("item id length {0} exceeds maximum of {MAX_ITEM_ID_BYTES} bytes")]
    TooLong(usize),
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// A schema-less item: a JSON object whose only required attribute is the
/// table's partition key.
///
/// The key attribute name is deployment configuration (`PRIMARY_KEY`), so it is
/// passed in rather than baked into the type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item(Map<String, Value>);

impl Item {
    /// Build an item from opaque attributes, setting `key` to `id`.
    ///
    /// Any value the attributes already carried under `key` is replaced.
    pub fn new(key: &str, id: &ItemId, mut attributes: Map<String, Value>) -> Self {
        attributes.insert(key.to_string(), Value::String(id.to_string()));
        Self(attributes)
    }

    /// Wrap an attribute map read back from storage.
    pub fn from_attributes(attributes: Map<String, Value>) -> Self {
        Self(attributes)
    }

    /// The item's key value, if present and a string.
    pub fn id<'a>(&'a self, key: &str) -> Option<&'a str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_attributes(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Item> for Value {
    fn from(item: Item) -> Self {
        Value::Object(item.0)
    }
}

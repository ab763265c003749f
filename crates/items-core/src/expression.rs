use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::CoreError;

/// Placeholder bound to the partition key attribute name.
pub const KEY_PLACEHOLDER: &str = "#pk";

/// Condition that holds only when the item already exists.
pub fn item_exists() -> String {
    format!("attribute_exists({KEY_PLACEHOLDER})")
}

/// Condition that holds only when the item does not exist yet.
pub fn item_absent() -> String {
    format!("attribute_not_exists({KEY_PLACEHOLDER})")
}

/// DynamoDB rejects empty top-level attribute names.
pub fn validate_attribute_names(attributes: &Map<String, Value>) -> Result<(), CoreError> {
    if attributes.contains_key("") {
        return Err(CoreError::InvalidItem(
            "attribute names must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Check that `changes` is a usable update for a table keyed on `key`.
pub fn validate_changes(key: &str, changes: &Map<String, Value>) -> Result<(), CoreError> {
    if changes.is_empty() {
        return Err(CoreError::InvalidItem("no attributes to update".to_string()));
    }
    validate_attribute_names(changes)?;
    if changes.contains_key(key) {
        return Err(CoreError::InvalidItem(format!(
            "cannot update key attribute {key}"
        )));
    }
    Ok(())
}

/// A `SET` update over arbitrary attribute names.
///
/// Every name and value goes through a placeholder, so reserved words and
/// names with dots or dashes are safe.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateExpression {
    /// e.g. `SET #a0 = :v0, #a1 = :v1`
    pub expression: String,
    /// Guards the update against creating a new item.
    pub condition: String,
    pub names: HashMap<String, String>,
    pub values: Vec<(String, Value)>,
}

impl UpdateExpression {
    /// Build the update for `changes` on a table keyed on `key`.
    ///
    /// Attributes are numbered in the map's iteration order, which is sorted
    /// by name.
    pub fn build(key: &str, changes: &Map<String, Value>) -> Result<Self, CoreError> {
        validate_changes(key, changes)?;

        let mut names = HashMap::with_capacity(changes.len() + 1);
        names.insert(KEY_PLACEHOLDER.to_string(), key.to_string());

        let mut assignments = Vec::with_capacity(changes.len());
        let mut values = Vec::with_capacity(changes.len());

        for (i, (name, value)) in changes.iter().enumerate() {
            let name_placeholder = format!("#a{i}");
            let value_placeholder = format!(":v{i}");
            assignments.push(format!("{name_placeholder} = {value_placeholder}"));
            names.insert(name_placeholder, name.clone());
            values.push((value_placeholder, value.clone()));
        }

        Ok(Self {
            expression: format!("SET {}", assignments.join(", ")),
            condition: item_exists(),
            names,
            values,
        })
    }
}

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::expression;
use crate::model::{Item, ItemId};
use crate::store::ItemStore;

/// Process-local store with the same conditional semantics as
/// [`DynamoStore`](crate::DynamoStore). Used by the local server and tests.
#[derive(Debug)]
pub struct MemoryStore {
    primary_key: String,
    items: RwLock<BTreeMap<String, Item>>,
}

impl MemoryStore {
    pub fn new(primary_key: impl Into<String>) -> Self {
        Self {
            primary_key: primary_key.into(),
            items: RwLock::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ItemStore for MemoryStore {
    fn primary_key(&self) -> &str {
        &self.primary_key
    }

    async fn get_item(&self, id: &ItemId) -> Result<Option<Item>, CoreError> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(id.as_ref()).cloned())
    }

    async fn list_items(&self) -> Result<Vec<Item>, CoreError> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        Ok(items.values().cloned().collect())
    }

    async fn create_item(&self, item: &Item) -> Result<(), CoreError> {
        let id = item.id(&self.primary_key).ok_or_else(|| {
            CoreError::InvalidItem(format!("missing string key attribute {}", self.primary_key))
        })?;
        expression::validate_attribute_names(item.attributes())?;

        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        if items.contains_key(id) {
            return Err(CoreError::AlreadyExists(id.to_string()));
        }
        items.insert(id.to_string(), item.clone());
        Ok(())
    }

    async fn update_item(&self, id: &ItemId, changes: &Map<String, Value>) -> Result<(), CoreError> {
        expression::validate_changes(&self.primary_key, changes)?;

        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let existing = items
            .remove(id.as_ref())
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        let mut attributes = existing.into_attributes();
        attributes.extend(changes.iter().map(|(k, v)| (k.clone(), v.clone())));
        items.insert(id.to_string(), Item::from_attributes(attributes));
        Ok(())
    }

    async fn delete_item(&self, id: &ItemId) -> Result<(), CoreError> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items
            .remove(id.as_ref())
            .map(|_| ())
            .ok_or_else(|| CoreError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn item(id: &str, attrs: Value) -> Item {
        let Value::Object(attrs) = attrs else {
            panic!("attributes must be an object")
        };
        Item::new("itemId", &ItemId::new(id).unwrap(), attrs)
    }

    fn id(s: &str) -> ItemId {
        ItemId::new(s).unwrap()
    }

    #[tokio::test]
    async fn create_then_get() {
        let store = MemoryStore::new("itemId");
        store.create_item(&item("1", json!({"name": "lamp"}))).await.unwrap();

        let found = store.get_item(&id("1")).await.unwrap().unwrap();
        assert_eq!(found.attributes()["name"], json!("lamp"));
        assert!(store.get_item(&id("2")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_rejects_duplicate_key() {
        let store = MemoryStore::new("itemId");
        store.create_item(&item("1", json!({}))).await.unwrap();
        let err = store.create_item(&item("1", json!({}))).await.unwrap_err();
        assert!(matches!(err, CoreError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn update_merges_attributes() {
        let store = MemoryStore::new("itemId");
        store
            .create_item(&item("1", json!({"name": "lamp", "size": 1})))
            .await
            .unwrap();

        let Value::Object(changes) = json!({"size": 2, "color": "red"}) else { unreachable!() };
        store.update_item(&id("1"), &changes).await.unwrap();

        let found = store.get_item(&id("1")).await.unwrap().unwrap();
        assert_eq!(
            Value::from(found),
            json!({"itemId": "1", "name": "lamp", "size": 2, "color": "red"})
        );
    }

    #[tokio::test]
    async fn empty_attribute_names_are_rejected() {
        let store = MemoryStore::new("itemId");
        let err = store.create_item(&item("1", json!({"": 1}))).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidItem(_)));
        assert!(store.is_empty());

        store.create_item(&item("2", json!({}))).await.unwrap();
        let Value::Object(changes) = json!({"": 2}) else { unreachable!() };
        let err = store.update_item(&id("2"), &changes).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidItem(_)));
    }

    #[tokio::test]
    async fn update_missing_item_is_not_found() {
        let store = MemoryStore::new("itemId");
        let Value::Object(changes) = json!({"size": 2}) else { unreachable!() };
        let err = store.update_item(&id("nope"), &changes).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_once() {
        let store = MemoryStore::new("itemId");
        store.create_item(&item("1", json!({}))).await.unwrap();

        store.delete_item(&id("1")).await.unwrap();
        assert!(store.is_empty());

        let err = store.delete_item(&id("1")).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_returns_every_item() {
        let store = MemoryStore::new("itemId");
        for n in ["a", "b", "c"] {
            store.create_item(&item(n, json!({}))).await.unwrap();
        }
        assert_eq!(store.list_items().await.unwrap().len(), 3);
    }
}

use std::future::Future;

use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::model::{Item, ItemId};

/// Storage operations behind the five handlers.
///
/// Implementations own the partition key attribute name, so callers only pass
/// ids and opaque attributes.
pub trait ItemStore: Send + Sync + 'static {
    /// Name of the partition key attribute.
    fn primary_key(&self) -> &str;

    /// Fetch one item, `None` if absent.
    fn get_item(&self, id: &ItemId) -> impl Future<Output = Result<Option<Item>, CoreError>> + Send;

    /// Every item in the table.
    fn list_items(&self) -> impl Future<Output = Result<Vec<Item>, CoreError>> + Send;

    /// Insert a new item. Fails with [`CoreError::AlreadyExists`] if the key
    /// is taken.
    fn create_item(&self, item: &Item) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Set the given attributes on an existing item. Fails with
    /// [`CoreError::NotFound`] if the item does not exist.
    fn update_item(
        &self,
        id: &ItemId,
        changes: &Map<String, Value>,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Remove an item. Fails with [`CoreError::NotFound`] if it does not exist.
    fn delete_item(&self, id: &ItemId) -> impl Future<Output = Result<(), CoreError>> + Send;
}

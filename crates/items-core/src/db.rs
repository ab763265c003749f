use std::collections::HashMap;

use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::CoreError;
use crate::expression::{self, KEY_PLACEHOLDER, UpdateExpression};
use crate::model::{Item, ItemId};
use crate::store::ItemStore;

/// DynamoDB client wrapper for item storage.
#[derive(Clone)]
pub struct DynamoStore {
    client: Client,
    table_name: String,
    primary_key: String,
    page_size: Option<i32>,
}

impl DynamoStore {
    /// Create a new `DynamoStore` by loading AWS configuration from the
    /// environment and constructing a DynamoDB client.
    pub async fn new(table_name: impl Into<String>, primary_key: impl Into<String>) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::with_client(Client::new(&config), table_name, primary_key)
    }

    /// Wrap an already configured client.
    pub fn with_client(
        client: Client,
        table_name: impl Into<String>,
        primary_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            primary_key: primary_key.into(),
            page_size: None,
        }
    }

    /// Cap every scan page at `limit` items.
    pub fn with_page_size(mut self, limit: i32) -> Self {
        self.page_size = Some(limit);
        self
    }

    fn key(&self, id: &ItemId) -> (String, AttributeValue) {
        (self.primary_key.clone(), AttributeValue::S(id.to_string()))
    }
}

/// Map a failed request to `on_condition_failed` when its condition expression
/// rejected the write, and to [`CoreError::Dynamo`] otherwise.
fn conditional(
    err: aws_sdk_dynamodb::Error,
    on_condition_failed: impl FnOnce() -> CoreError,
) -> CoreError {
    match err {
        aws_sdk_dynamodb::Error::ConditionalCheckFailedException(_) => on_condition_failed(),
        other => CoreError::Dynamo(other),
    }
}

fn to_item(raw: HashMap<String, AttributeValue>) -> Result<Item, CoreError> {
    let attributes: Map<String, Value> = serde_dynamo::from_item(raw)?;
    Ok(Item::from_attributes(attributes))
}

impl ItemStore for DynamoStore {
    fn primary_key(&self) -> &str {
        &self.primary_key
    }

    async fn get_item(&self, id: &ItemId) -> Result<Option<Item>, CoreError> {
        let (key, value) = self.key(id);
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(key, value)
            .send()
            .await
            .map_err(aws_sdk_dynamodb::Error::from)?;

        output.item.map(to_item).transpose()
    }

    async fn list_items(&self) -> Result<Vec<Item>, CoreError> {
        let mut items = Vec::new();
        let mut start_key = None;
        let mut pages = 0u32;

        loop {
            let output = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(start_key.take())
                .set_limit(self.page_size)
                .send()
                .await
                .map_err(aws_sdk_dynamodb::Error::from)?;
            pages += 1;

            for raw in output.items.unwrap_or_default() {
                items.push(to_item(raw)?);
            }

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        debug!(pages, count = items.len(), "scanned table");
        Ok(items)
    }

    async fn create_item(&self, item: &Item) -> Result<(), CoreError> {
        let id = item.id(&self.primary_key).ok_or_else(|| {
            CoreError::InvalidItem(format!("missing string key attribute {}", self.primary_key))
        })?;
        expression::validate_attribute_names(item.attributes())?;
        let raw: HashMap<String, AttributeValue> = serde_dynamo::to_item(item.attributes())?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(raw))
            .condition_expression(expression::item_absent())
            .expression_attribute_names(KEY_PLACEHOLDER, &self.primary_key)
            .send()
            .await
            .map_err(|e| {
                conditional(aws_sdk_dynamodb::Error::from(e), || {
                    CoreError::AlreadyExists(id.to_string())
                })
            })?;

        Ok(())
    }

    async fn update_item(&self, id: &ItemId, changes: &Map<String, Value>) -> Result<(), CoreError> {
        let update = UpdateExpression::build(&self.primary_key, changes)?;
        let (key, value) = self.key(id);

        let mut request = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key(key, value)
            .update_expression(update.expression)
            .condition_expression(update.condition)
            .set_expression_attribute_names(Some(update.names));

        for (placeholder, value) in update.values {
            let value: AttributeValue = serde_dynamo::to_attribute_value(value)?;
            request = request.expression_attribute_values(placeholder, value);
        }

        request.send().await.map_err(|e| {
            conditional(aws_sdk_dynamodb::Error::from(e), || {
                CoreError::NotFound(id.to_string())
            })
        })?;

        Ok(())
    }

    async fn delete_item(&self, id: &ItemId) -> Result<(), CoreError> {
        let (key, value) = self.key(id);

        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key(key, value)
            .condition_expression(expression::item_exists())
            .expression_attribute_names(KEY_PLACEHOLDER, &self.primary_key)
            .send()
            .await
            .map_err(|e| {
                conditional(aws_sdk_dynamodb::Error::from(e), || {
                    CoreError::NotFound(id.to_string())
                })
            })?;

        Ok(())
    }
}

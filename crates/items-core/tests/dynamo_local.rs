//! `DynamoStore` against DynamoDB Local.
//!
//! ```bash
//! docker run --rm -p 8000:8000 amazon/dynamodb-local
//! AWS_ENDPOINT_URL=http://localhost:8000 cargo test -p items-core --test dynamo_local -- --ignored
//! ```

use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType,
};
use serde_json::{Map, Value, json};

use items_core::{CoreError, DynamoStore, Item, ItemId, ItemStore};

const DEFAULT_ENDPOINT: &str = "http://localhost:8000";
const KEY: &str = "itemId";

async fn local_client() -> Client {
    let endpoint = std::env::var("AWS_ENDPOINT_URL").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
    let config = aws_config::defaults(BehaviorVersion::latest())
        .region(aws_config::Region::new("us-east-1"))
        .endpoint_url(endpoint)
        .credentials_provider(Credentials::new("local", "local", None, None, "dynamodb-local"))
        .load()
        .await;
    Client::new(&config)
}

/// A fresh table per test so tests can run in parallel.
async fn fresh_store() -> DynamoStore {
    let client = local_client().await;
    let table = format!("items-{}", ItemId::generate());

    client
        .create_table()
        .table_name(&table)
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name(KEY)
                .attribute_type(ScalarAttributeType::S)
                .build()
                .unwrap(),
        )
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name(KEY)
                .key_type(KeyType::Hash)
                .build()
                .unwrap(),
        )
        .billing_mode(BillingMode::PayPerRequest)
        .send()
        .await
        .unwrap();

    DynamoStore::with_client(client, table, KEY)
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn item(id: &ItemId, attrs: Value) -> Item {
    Item::new(KEY, id, object(attrs))
}

#[tokio::test]
#[ignore = "needs DynamoDB Local"]
async fn create_is_conditional_on_absence() {
    let store = fresh_store().await;
    let id = ItemId::generate();

    store.create_item(&item(&id, json!({"name": "lamp"}))).await.unwrap();
    let err = store.create_item(&item(&id, json!({"name": "other"}))).await.unwrap_err();
    assert!(matches!(err, CoreError::AlreadyExists(found) if found == id.to_string()));

    let stored = store.get_item(&id).await.unwrap().unwrap();
    assert_eq!(stored.attributes()["name"], json!("lamp"));
}

#[tokio::test]
#[ignore = "needs DynamoDB Local"]
async fn update_sets_reserved_word_attributes() {
    let store = fresh_store().await;
    let id = ItemId::generate();
    store.create_item(&item(&id, json!({"name": "lamp"}))).await.unwrap();

    let changes = object(json!({"name": "desk lamp", "size": 3, "status": "on"}));
    store.update_item(&id, &changes).await.unwrap();

    let stored = store.get_item(&id).await.unwrap().unwrap();
    assert_eq!(
        Value::from(stored),
        json!({"itemId": id.to_string(), "name": "desk lamp", "size": 3, "status": "on"})
    );
}

#[tokio::test]
#[ignore = "needs DynamoDB Local"]
async fn update_of_missing_item_is_not_found() {
    let store = fresh_store().await;
    let id = ItemId::generate();

    let err = store
        .update_item(&id, &object(json!({"name": "ghost"})))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
    assert!(store.get_item(&id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "needs DynamoDB Local"]
async fn delete_twice_is_not_found() {
    let store = fresh_store().await;
    let id = ItemId::generate();
    store.create_item(&item(&id, json!({}))).await.unwrap();

    store.delete_item(&id).await.unwrap();
    let err = store.delete_item(&id).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
#[ignore = "needs DynamoDB Local"]
async fn list_follows_scan_pages() {
    let store = fresh_store().await.with_page_size(2);
    for n in 0..5 {
        store.create_item(&item(&ItemId::generate(), json!({"n": n}))).await.unwrap();
    }

    let mut seen: Vec<i64> = store
        .list_items()
        .await
        .unwrap()
        .iter()
        .map(|item| item.attributes()["n"].as_i64().unwrap())
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, [0, 1, 2, 3, 4]);
}

#[tokio::test]
#[ignore = "needs DynamoDB Local"]
async fn empty_attribute_name_never_reaches_dynamodb() {
    let store = fresh_store().await;
    let id = ItemId::generate();

    let err = store.create_item(&item(&id, json!({"": 1}))).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidItem(_)));
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value};
use tracing::info;

use items_core::expression::validate_attribute_names;
use items_core::{Item, ItemId, ItemStore, Operation};

use crate::errors::ApiError;

/// A successful handler outcome, independent of the transport that carries it.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    /// JSON body; `None` means an empty body.
    pub body: Option<Value>,
}

impl Reply {
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    pub fn empty(status: StatusCode) -> Self {
        Self { status, body: None }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self.body {
            Some(body) => (self.status, axum::Json(body)).into_response(),
            None => self.status.into_response(),
        }
    }
}

/// The parts of an HTTP request a handler looks at.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationRequest<'a> {
    /// The `{id}` path parameter.
    pub id: Option<&'a str>,
    /// Raw request body.
    pub body: Option<&'a str>,
}

/// The five CRUD handlers over an [`ItemStore`].
pub struct ItemsService<S> {
    store: S,
}

impl<S: ItemStore> ItemsService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run the handler for `operation`.
    pub async fn dispatch(
        &self,
        operation: Operation,
        request: OperationRequest<'_>,
    ) -> Result<Reply, ApiError> {
        match operation {
            Operation::GetOne => self.get_one(request.id).await,
            Operation::GetAll => self.get_all().await,
            Operation::Create => self.create(request.body).await,
            Operation::UpdateOne => self.update_one(request.id, request.body).await,
            Operation::DeleteOne => self.delete_one(request.id).await,
        }
    }

    /// GET /items
    pub async fn get_all(&self) -> Result<Reply, ApiError> {
        let items = self.store.list_items().await?;
        info!(count = items.len(), "listed items");

        let items = items.into_iter().map(Value::from).collect();
        Ok(Reply::json(StatusCode::OK, Value::Array(items)))
    }

    /// GET /items/{id}
    pub async fn get_one(&self, id: Option<&str>) -> Result<Reply, ApiError> {
        let id = parse_id(id)?;
        match self.store.get_item(&id).await? {
            Some(item) => Ok(Reply::json(StatusCode::OK, item.into())),
            None => Err(ApiError::NotFound(id.to_string())),
        }
    }

    /// POST /items
    ///
    /// The key attribute is always server-generated; a client-supplied value
    /// is overwritten.
    pub async fn create(&self, body: Option<&str>) -> Result<Reply, ApiError> {
        let attributes = parse_object(body)?;
        let key = self.store.primary_key();
        let id = ItemId::generate();

        self.store
            .create_item(&Item::new(key, &id, attributes))
            .await?;
        info!(item_id = %id, "created item");

        let mut created = Map::new();
        created.insert(key.to_string(), Value::String(id.to_string()));
        Ok(Reply::json(StatusCode::CREATED, Value::Object(created)))
    }

    /// PATCH /items/{id}
    pub async fn update_one(&self, id: Option<&str>, body: Option<&str>) -> Result<Reply, ApiError> {
        let body = non_empty(body).ok_or(ApiError::MissingBody)?;
        let id = parse_id(id)?;
        let changes = parse_object(Some(body))?;
        if changes.is_empty() {
            return Err(ApiError::NoArguments);
        }

        self.store.update_item(&id, &changes).await?;
        info!(item_id = %id, attributes = changes.len(), "updated item");

        Ok(Reply::empty(StatusCode::NO_CONTENT))
    }

    /// DELETE /items/{id}
    pub async fn delete_one(&self, id: Option<&str>) -> Result<Reply, ApiError> {
        let id = parse_id(id)?;
        self.store.delete_item(&id).await?;
        info!(item_id = %id, "deleted item");

        Ok(Reply::empty(StatusCode::OK))
    }
}

/// Request bodies are JSON text; anything else is a client error.
pub fn utf8_body(bytes: &[u8]) -> Result<&str, ApiError> {
    std::str::from_utf8(bytes)
        .map_err(|_| ApiError::BadRequest("request body must be UTF-8 JSON".to_string()))
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

fn parse_id(raw: Option<&str>) -> Result<ItemId, ApiError> {
    let raw = raw.filter(|s| !s.is_empty()).ok_or(ApiError::MissingId)?;
    ItemId::new(raw).map_err(|e| ApiError::BadRequest(e.to_string()))
}

fn parse_object(body: Option<&str>) -> Result<Map<String, Value>, ApiError> {
    let body = non_empty(body).ok_or(ApiError::MissingBody)?;
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => {
            validate_attribute_names(&map)?;
            Ok(map)
        }
        Ok(_) => Err(ApiError::BadRequest(
            "request body must be a JSON object".to_string(),
        )),
        Err(e) => Err(ApiError::BadRequest(format!(
            "request body is not valid JSON: {e}"
        ))),
    }
}

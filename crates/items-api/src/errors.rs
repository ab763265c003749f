use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use items_core::CoreError;

pub const MISSING_BODY: &str = "invalid request, you are missing the parameter body";
pub const MISSING_ID: &str = "invalid request, you are missing the path parameter id";
pub const NO_ARGUMENTS: &str = "invalid request, no arguments provided";
pub const EXECUTION_ERROR: &str =
    "Error: Execution update, caused a Dynamodb error, please take a look at your CloudWatch Logs.";

/// API error types with JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// Request body absent or empty.
    MissingBody,
    /// `{id}` path parameter absent.
    MissingId,
    /// Update body with no attributes.
    NoArguments,
    /// Body that is not a JSON object, or an unusable item id.
    BadRequest(String),
    /// Item not found.
    NotFound(String),
    /// Storage failure.
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingBody
            | ApiError::MissingId
            | ApiError::NoArguments
            | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::MissingBody => MISSING_BODY.to_string(),
            ApiError::MissingId => MISSING_ID.to_string(),
            ApiError::NoArguments => NO_ARGUMENTS.to_string(),
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::NotFound(id) => format!("item {id} not found"),
            ApiError::Internal => EXECUTION_ERROR.to_string(),
        }
    }

    /// The `{"error": ...}` document sent to clients.
    pub fn body(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.message() })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), axum::Json(self.body())).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(id) => ApiError::NotFound(id),
            CoreError::ItemId(e) => ApiError::BadRequest(e.to_string()),
            CoreError::InvalidItem(msg) => ApiError::BadRequest(msg),
            other => {
                tracing::error!(error = %other, "storage request failed");
                ApiError::Internal
            }
        }
    }
}

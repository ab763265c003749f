use thiserror::Error;

/// Core errors for the items service.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("DynamoDB error: {0}")]
    Dynamo(#[from] aws_sdk_dynamodb::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_dynamo::Error),

    #[error("Item id validation error: {0}")]
    ItemId(#[from] crate::model::ItemIdError),

    #[error("Invalid item: {0}")]
    InvalidItem(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),
}

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),

    #[error("environment variable {0} must not be empty")]
    Empty(&'static str),

    #[error("unknown store kind {0:?}, expected \"dynamodb\" or \"memory\"")]
    UnknownStore(String),

    #[error("invalid bind address {0:?}: {1}")]
    BindAddr(String, std::net::AddrParseError),
}

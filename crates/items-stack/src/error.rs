use items_core::Method;
use thiserror::Error;

/// Errors raised while composing or writing a template.
#[derive(Debug, Error)]
pub enum StackError {
    #[error("logical id {0:?} is already defined in the template")]
    DuplicateLogicalId(String),

    #[error("invalid logical id {0:?}: must be 1-255 alphanumeric characters")]
    InvalidLogicalId(String),

    #[error("method {method} is already registered on {path}")]
    DuplicateMethod { method: Method, path: String },

    #[error("no resource with logical id {0:?}")]
    UnknownResource(String),

    #[error("resource {0:?} has an unexpected shape")]
    MalformedResource(String),

    #[error("template serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("cannot write template: {0}")]
    Io(#[from] std::io::Error),
}

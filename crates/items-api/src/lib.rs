pub mod errors;
pub mod lambda;
pub mod local;
pub mod service;

pub use errors::ApiError;
pub use service::{ItemsService, OperationRequest, Reply};

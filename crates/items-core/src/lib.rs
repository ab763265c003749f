pub mod config;
pub mod cors;
pub mod db;
pub mod error;
pub mod expression;
pub mod memory;
pub mod model;
pub mod operation;
pub mod store;
pub mod telemetry;

pub use config::{Config, LocalConfig, StoreKind};
pub use db::DynamoStore;
pub use error::{ConfigError, CoreError};
pub use memory::MemoryStore;
pub use model::{Item, ItemId, ItemIdError};
pub use operation::{Method, Operation, ROUTES, Route};
pub use store::ItemStore;

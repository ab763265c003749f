use std::net::SocketAddr;

use crate::error::ConfigError;

/// Partition key attribute used when `PRIMARY_KEY` is not set.
pub const DEFAULT_PRIMARY_KEY: &str = "itemId";

pub const PRIMARY_KEY_VAR: &str = "PRIMARY_KEY";
pub const TABLE_NAME_VAR: &str = "TABLE_NAME";
pub const BIND_ADDR_VAR: &str = "BIND_ADDR";
pub const STORE_VAR: &str = "ITEMS_STORE";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Handler configuration, injected by the stack into every function's
/// environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Name of the table's partition key attribute.
    pub primary_key: String,
    /// Physical table name.
    pub table_name: String,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's value
    /// if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let table_name = required(&lookup, TABLE_NAME_VAR)?;
        let primary_key = match lookup(PRIMARY_KEY_VAR) {
            Some(key) if key.is_empty() => return Err(ConfigError::Empty(PRIMARY_KEY_VAR)),
            Some(key) => key,
            None => DEFAULT_PRIMARY_KEY.to_string(),
        };

        Ok(Self {
            primary_key,
            table_name,
        })
    }
}

/// Which store the local development server talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Dynamo,
    Memory,
}

/// Configuration of the local development server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreKind,
    pub primary_key: String,
    /// Required only for [`StoreKind::Dynamo`].
    pub table_name: Option<String>,
}

impl LocalConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_addr = lookup(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .parse()
            .map_err(|e| ConfigError::BindAddr(raw_addr.clone(), e))?;

        let store = match lookup(STORE_VAR).as_deref() {
            None | Some("dynamodb") => StoreKind::Dynamo,
            Some("memory") => StoreKind::Memory,
            Some(other) => return Err(ConfigError::UnknownStore(other.to_string())),
        };

        let table_name = match store {
            StoreKind::Dynamo => Some(required(&lookup, TABLE_NAME_VAR)?),
            StoreKind::Memory => lookup(TABLE_NAME_VAR),
        };

        let primary_key = lookup(PRIMARY_KEY_VAR)
            .filter(|key| !key.is_empty())
            .unwrap_or_else(|| DEFAULT_PRIMARY_KEY.to_string());

        Ok(Self {
            bind_addr,
            store,
            primary_key,
            table_name,
        })
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    match lookup(name) {
        None => Err(ConfigError::Missing(name)),
        Some(value) if value.is_empty() => Err(ConfigError::Empty(name)),
        Some(value) => Ok(value),
    }
}

use items_api::{ItemsService, local};
use items_core::{ConfigError, DynamoStore, LocalConfig, MemoryStore, StoreKind, telemetry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    telemetry::init();

    let config = LocalConfig::from_env()?;
    tracing::info!(store = ?config.store, primary_key = %config.primary_key, "starting local items api");

    match config.store {
        StoreKind::Memory => {
            let store = MemoryStore::new(config.primary_key);
            local::serve(ItemsService::new(store), config.bind_addr).await?;
        }
        StoreKind::Dynamo => {
            let table_name = config.table_name.ok_or(ConfigError::Missing("TABLE_NAME"))?;
            let store = DynamoStore::new(table_name, config.primary_key).await;
            local::serve(ItemsService::new(store), config.bind_addr).await?;
        }
    }

    Ok(())
}

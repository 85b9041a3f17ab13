use std::sync::Arc;

use integration_auth::store::KeyValueStore;
use log::*;
use service::{config::Config, logging::Logger, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::new();
    Logger::init_logger(&config)?;

    info!(
        "Starting integration broker in {} mode",
        config.runtime_env()
    );

    let store = service::init_store();
    service::spawn_store_sweeper(store.clone(), config.store_sweep_interval());

    let store: Arc<dyn KeyValueStore> = Arc::new(store);
    let registry = service::init_registry(&config, store).inspect_err(|e| {
        error!("Failed to register integrations: {e}");
    })?;

    web::init_server(AppState::new(config, registry)).await?;

    Ok(())
}

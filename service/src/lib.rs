use config::Config;
use integration_auth::http::AuthenticatedClientBuilder;
use integration_auth::oauth::{providers, ProviderKind, Registry};
use integration_auth::store::{KeyValueStore, MemoryStore};
use integration_auth::Error;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

pub mod config;
pub mod logging;

/// The in-process key-value store backing states, verifiers and credentials.
pub fn init_store() -> MemoryStore {
    MemoryStore::new()
}

/// Periodically purge expired keys so abandoned authorizations do not accumulate.
///
/// `every` must be non-zero; `Config` rejects a zero sweep interval.
pub fn spawn_store_sweeper(store: MemoryStore, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let removed = store.sweep_expired();
            if removed > 0 {
                debug!("Swept {removed} expired store keys");
            }
        }
    })
}

/// Build the adapter registry from configuration.
///
/// Providers missing a client id, client secret or redirect URI are skipped with
/// a warning and answer like any unknown provider.
pub fn init_registry(config: &Config, store: Arc<dyn KeyValueStore>) -> Result<Registry, Error> {
    let http = AuthenticatedClientBuilder::from_config(config.http_client_config());
    let mut registry = Registry::new();

    for kind in ProviderKind::all() {
        match config.provider_config(kind) {
            Some(provider_config) => {
                let adapter = providers::build(kind, provider_config, Arc::clone(&store), &http)?;
                registry.register(kind.as_str(), adapter)?;
            }
            None => warn!(
                "{} is not configured (client id, client secret and redirect URI are required); skipping",
                kind.as_str()
            ),
        }
    }

    info!("Registered integrations: {:?}", registry.names());
    Ok(registry)
}

// Service-level state containing only infrastructure concerns
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub registry: Arc<Registry>,
}

impl AppState {
    pub fn new(app_config: Config, registry: Registry) -> Self {
        Self {
            config: app_config,
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &Registry {
        self.registry.as_ref()
    }
}

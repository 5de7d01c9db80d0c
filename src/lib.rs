pub mod api;
pub mod config;
pub mod logic;
pub mod model;
pub mod seed;
pub mod store;
pub mod view;

// Export API types
pub use api::handlers;
pub use api::routes;

pub use logic::{CrmError, CrmResult, Repository};

// Export all model types
pub use model::*;

// Export seed module
pub use seed::*;

// Export store types
pub use store::{MemoryStore, PostgresStore, SchemaNames, Store, StoreError};

use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::{AppConfig, StorageBackend};

/// Build the configured store, prepare it and serve the CRM until shutdown.
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    match config.storage.backend {
        StorageBackend::Postgres => {
            log::info!("Connecting to PostgreSQL...");
            let store = PostgresStore::new(
                &config.database_url()?,
                config.max_connections(),
                config.schema_names()?,
            )
            .await?;
            start(store, &config).await
        }
        StorageBackend::Memory => {
            log::warn!("Using the in-memory store; data is lost on shutdown");
            start(MemoryStore::new(), &config).await
        }
    }
}

async fn start<S: Store + 'static>(store: S, config: &AppConfig) -> anyhow::Result<()> {
    store.migrate().await?;
    log::info!("Database ready");

    if config.seed.load {
        log::info!("Loading seed data...");
        seed::load_seed_data(&store).await?;
    }

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!("CRM server running on http://{}", bind_address);

    serve(listener, Arc::new(store), &config.server.static_dir).await
}

/// Serve the API and the page on an already bound listener.
pub async fn serve<S: Store + 'static>(
    listener: TcpListener,
    store: Arc<S>,
    static_dir: &str,
) -> anyhow::Result<()> {
    let app = api::routes::create_app::<S>(static_dir).with_state(store);
    axum::serve(listener, app).await?;
    Ok(())
}

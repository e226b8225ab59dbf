//! POS Stock Tracker - Backend Server

use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pos_tracker_backend::{
    config::{Config, StoreBackend},
    create_app, AppState, InventoryStore, MemoryStore, PgStore, SystemClock,
};

const DEFAULT_LOG_FILTER: &str = "pos_server=debug,pos_tracker_backend=debug,tower_http=debug,sqlx=warn";

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    init_tracing(config.logging.json);

    tracing::info!("Starting POS Stock Tracker Server");
    tracing::info!("Environment: {}", config.environment);

    let store: Arc<dyn InventoryStore> = match config.store.backend {
        StoreBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let store = PgStore::connect(&config.database).await?;

            if config.database.run_migrations {
                tracing::info!("Running database migrations...");
                store.run_migrations().await?;
                tracing::info!("Migrations completed");
            }
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };
    tracing::info!("Store backend: {}", config.store.backend.as_str());

    // Create application state
    let state = AppState::new(store, Arc::new(SystemClock), config.clone());

    // Build application
    let app = create_app(state);

    // Start server
    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((host, config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

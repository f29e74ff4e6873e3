use std::sync::Arc;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use eventhub_server::config::{Config, StorageBackend};
use eventhub_server::routes::create_routes;
use eventhub_server::state::AppState;
use eventhub_server::store::{MemoryStore, PgStore, Store};

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();

    let store: Arc<dyn Store> = match config.storage {
        StorageBackend::Postgres => {
            let store = PgStore::connect(&config.database_url, config.max_connections)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Successfully connected to database");

            store.migrate().await.expect("Failed to run migrations");
            tracing::info!("Migrations run successfully");

            Arc::new(store)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    let app = create_routes(AppState::new(store), &config);

    let addr = config.addr();
    tracing::info!("Server running at http://{}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}

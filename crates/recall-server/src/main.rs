#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::sync::Arc;

use recall_server::config::ServerConfig;
use recall_server::{AppCore, build_router};
use recall_storage::paths;

#[tokio::main]
async fn main() {
    // Initialize tracing logger
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,recall_server=debug".into()),
        )
        .with_target(false)
        .init();

    tracing::info!("Starting Recall memory server");

    let config = ServerConfig::from_env();
    let db_path = config
        .database_path
        .clone()
        .map(Ok)
        .unwrap_or_else(paths::ensure_database_path_string)
        .expect("Failed to determine Recall database path");

    let core = Arc::new(AppCore::new(config, &db_path).expect("Failed to initialize app core"));

    let addr = format!("{}:{}", core.config.host, core.config.port);
    let app = build_router(core);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {addr}: {e}"));

    tracing::info!("Recall listening on http://{addr}");

    axum::serve(listener, app)
        .await
        .expect("Failed to run axum server");
}

mod config;
mod db;
mod rate_limit;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use services::storage::FsObjectStore;

#[tokio::main]
async fn main() {
    // A missing .env is fine; real deployments set the environment directly.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = config::ServerConfig::from_env().expect("invalid configuration");

    let pool = db::init_pool(&config.database_url, config.db_max_connections)
        .await
        .expect("database init failed");

    tokio::fs::create_dir_all(&config.storage_dir)
        .await
        .expect("failed to create storage directory");
    let storage = Arc::new(FsObjectStore::new(config.storage_dir.clone()));

    let port = config.port;
    let state = state::AppState::new(pool, config, storage);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "boardspace listening");
    axum::serve(listener, app).await.expect("server failed");
}

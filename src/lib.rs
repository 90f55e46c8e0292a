pub mod analytics;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod logger;
pub mod models;
pub mod pricing;
pub mod routes;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use config::Config;
use db::Database;
use error::{AppError, AppResult};

/// Opens the store, prepares the schema and serves the API until shutdown.
pub async fn run(config: Config) -> AppResult<()> {
    logger::init_logger(config.log_format);

    tracing::info!(environment = %config.environment, db = %config.db_path, "Royal Quads starting");

    let db = Database::open(&config.db_path)?;
    db.initialize()?;

    let app = routes::router(Arc::new(db));

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {e}")))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

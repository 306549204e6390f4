use std::sync::Arc;

use notekeep_api::{build_router, config::redact_database_url, telemetry, ApiConfig, AppState};
use notekeep_db::{Database, PoolConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env()?;
    let _log_guard = telemetry::init(&config.log);

    info!(
        json = config.log.json,
        log_file = config.log.file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );
    info!(
        database_url = %redact_database_url(&config.database_url),
        max_connections = config.max_connections,
        "Connecting to database"
    );

    let pool_config = PoolConfig::new().max_connections(config.max_connections);
    let db = Database::connect_with_config(&config.database_url, pool_config).await?;

    if config.run_migrations {
        info!("Running database migrations...");
        db.migrate().await?;
        info!("Database migrations complete");
    }

    let state = AppState::new(Arc::new(db));
    let app = build_router(state, config.allowed_origins.clone());

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Starting server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

//! Wiring binary: loads configuration, connects to the database, runs
//! migrations, and exposes a health check. No HTTP surface lives here —
//! routing, auth, and the rest of a deployment's outer surface are out of
//! this engine's scope.

use mediaflow_service::config::ServiceConfig;
use mediaflow_service::db::{DatabaseConnection, SqlitePersistence, SqliteSessionStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(rust_log).init();

    tracing::info!("loading service configuration");
    let config = ServiceConfig::load()?;
    tracing::info!(
        database_url = %config.database_url,
        pool_size = config.pool_size,
        "configuration loaded"
    );

    let db = DatabaseConnection::with_max_connections(&config.database_url, config.pool_size)
        .await?;

    tracing::info!("running migrations");
    db.run_migrations().await?;

    db.health_check().await?;
    tracing::info!("database healthy");

    let _persistence = SqlitePersistence::new(db.pool().clone());
    let _session_store = SqliteSessionStore::new(db.pool().clone());

    tracing::info!("mediaflow-service adapters wired, ready for a scheduler to drive them");
    Ok(())
}

use std::net::SocketAddr;
use std::sync::Arc;

use na_inventory::config::Config;
use na_inventory::db::{create_pool, run_migrations};
use na_inventory::services::{router, AppState};
use na_inventory::storage::LocalDiskStorage;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "na_inventory=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Starting na-inventory API server...");
    tracing::info!("Connecting to database...");

    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Database connection established");

    if config.run_migrations {
        run_migrations(&pool).await?;
        tracing::info!("Database migrations applied");
    } else {
        tracing::info!("Skipping migrations (RUN_MIGRATIONS=false)");
    }

    let storage = LocalDiskStorage::new(config.upload_dir.clone()).await?;

    let addr: SocketAddr = config.server_addr().parse()?;
    let app = router(AppState::new(pool, config, Arc::new(storage)));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

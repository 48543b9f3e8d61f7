use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::app::app;
use crate::auth::{JwtService, UserDirectory};
use crate::config::config;
use crate::database::{DatabaseManager, MemoryStore, PgStore, Store};
use crate::is_production;
use crate::seed;
use crate::state::AppState;

/// Postgres when a database URL is configured, otherwise (or with `--memory`)
/// the in-process store.
async fn open_store(memory: bool) -> anyhow::Result<Arc<dyn Store>> {
    let database = &config().database;
    if memory || database.url.is_none() {
        if is_production!() {
            warn!("Running with the in-memory store in production; data is lost on restart");
        }
        info!("Using in-memory store");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let pool = DatabaseManager::connect(database)
        .await
        .context("Failed to connect to database")?;
    DatabaseManager::ensure_schema(&pool)
        .await
        .context("Failed to create schema")?;
    Ok(Arc::new(PgStore::new(pool)))
}

async fn prepare(store: &dyn Store, force_seed: bool) -> anyhow::Result<()> {
    let app_config = config();
    seed::wait_for_schema(store, &app_config.database).await?;

    let mut seed_config = app_config.seed.clone();
    seed_config.enabled |= force_seed;
    let outcome = seed::initialize(store, &seed_config).await?;
    info!("Initializer finished: {:?}", outcome);
    Ok(())
}

pub async fn serve(port: Option<u16>, memory: bool) -> anyhow::Result<()> {
    let app_config = config();
    info!("Starting client-contract-api in {:?} mode", app_config.environment);

    let store = open_store(memory).await?;
    prepare(store.as_ref(), false).await?;

    let jwt = JwtService::from_config(&app_config.security).context("Invalid JWT configuration")?;
    let directory = UserDirectory::from_entries(&app_config.security.users);
    if directory.is_empty() {
        warn!("No login users configured; every protected route will answer 401");
    }
    let state = AppState::new(store, jwt, Arc::new(directory));

    let bind_addr = format!("0.0.0.0:{}", port.unwrap_or(app_config.api.port));
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    Ok(())
}

pub async fn seed(force: bool) -> anyhow::Result<()> {
    let store = open_store(false).await?;
    prepare(store.as_ref(), force).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

//! trailpass server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints and the
//! background expiry sweeper.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use trailpass::api;
use trailpass::app_state::AppState;
use trailpass::config::Config;
use trailpass::domain::badge::default_catalog;
use trailpass::persistence::{MemoryStore, PostgresStore, Store};
use trailpass::service::SystemClock;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid LISTEN_ADDR")?;
    init_tracing(config.log_json);
    tracing::info!(addr = %config.listen_addr, "starting trailpass");

    let store = open_store(&config).await?;
    let inserted = store
        .ensure_badges(&default_catalog())
        .await
        .context("seeding badge catalog")?;
    tracing::info!(backend = store.backend(), badges_inserted = inserted, "store ready");

    let state = AppState::new(store, Arc::new(SystemClock), &config);

    let sweeper = config
        .expiry_sweep_interval()
        .map(|interval| (*state.sweeper).clone().spawn(interval));

    let app = api::build_app(state, &config);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")?;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    tracing::info!("trailpass stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn open_store(config: &Config) -> anyhow::Result<Store> {
    if !config.persistence_enabled {
        tracing::warn!("persistence disabled, state is kept in memory only");
        return Ok(Store::Memory(MemoryStore::new()));
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await
        .context("connecting to PostgreSQL")?;
    let store = PostgresStore::new(pool);
    store.migrate().await.context("running migrations")?;
    Ok(Store::Postgres(store))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("shutdown signal received");
}

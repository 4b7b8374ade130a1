//! HTTP surface of the Keygate PIN access-control backend.
//!
//! Keypads call `POST /api/access/verify`; administrators manage devices,
//! users, configuration and logs through the rest of `/api`. All logic lives
//! in `keygate_storage`; this crate wires configuration, logging and the axum
//! router around it.

pub mod api;
pub mod config;
pub mod state;

pub use config::Config;
pub use state::AppState;

use anyhow::Context;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .context("Failed to install tracing subscriber")?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .context("Failed to install tracing subscriber")?;
    }

    Ok(())
}

/// Open the database, bind and serve until Ctrl-C.
pub async fn run(config: Config) -> anyhow::Result<()> {
    config.validate()?;
    let addr = config.bind_addr()?;

    let state = AppState::new(config).await?;
    info!(
        tenancy = ?state.access.tenancy(),
        database = %state.config.database.path,
        trusted_proxies = state.trusted_proxies.len(),
        "Keygate starting"
    );

    let app = api::router(state.clone());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Shutting down");
    state.db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

use std::net::SocketAddr;

use anyhow::Context;
use chat_relay::{config::Config, routes, state::AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("profile  = {}", config.profile);
    tracing::info!("backend  = {}", config.backend_base_url);
    tracing::info!("model    = {}", config.model_name);
    tracing::info!("timeout  = {:?}", config.upstream_timeout);
    tracing::info!("origins  = {:?}", config.allowed_origins);
    if config.credential_missing() {
        tracing::warn!("no API key configured, /chat will fail until API_KEY is set");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::shared(config).context("build application state")?;
    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    tracing::info!("chat relay running at http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

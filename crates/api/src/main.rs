use anyhow::Result;
use api::{create_router, logging, AppState};
use shared::config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_from_env();

    let config = Config::from_env()?;
    info!(
        wallets_file = %config.data.wallets_file,
        tokens_dir = %config.data.tokens_dir,
        active_networks = ?config.data.active_networks,
        "Configuration loaded"
    );

    let shutdown = CancellationToken::new();
    let state = Arc::new(AppState::from_config(&config, shutdown.clone())?);

    let refresh = state.prices.clone().spawn_refresh_loop(shutdown.clone());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    if let Err(e) = refresh.await {
        tracing::warn!(error = %e, "Price refresh loop ended abnormally");
    }
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
    shutdown.cancel();
}

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::{handlers, AppState};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))

        // Portfolios
        .route("/portfolios", get(handlers::get_portfolios))
        .route("/portfolios/failed", get(handlers::get_failed_wallets))
        .route("/portfolios/:wallet", get(handlers::get_wallet_portfolio))
        .route("/portfolios/:wallet/:network", get(handlers::get_wallet_network_portfolio))

        .with_state(state)
}

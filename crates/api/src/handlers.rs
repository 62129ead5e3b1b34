use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use shared::config::parse_list;
use shared::{PortfolioError, WalletPortfolio};
use std::sync::Arc;

use crate::error::ApiResult;
use crate::AppState;

pub const STATUS_TOTAL_FAILURE: &str = "Failed to retrieve any portfolios due to service errors.";
pub const STATUS_PARTIAL: &str = "Portfolios retrieved. Some wallets or tokens may have encountered errors.";
pub const STATUS_EMPTY: &str = "No portfolio data found. Check wallet list and network/token configurations.";
pub const STATUS_OK: &str = "Portfolios retrieved successfully.";

#[derive(Debug, Default, Deserialize)]
pub struct NetworkQuery {
    /// Comma-separated network selectors. Absent or `all` means every network.
    pub networks: Option<String>,
}

impl NetworkQuery {
    fn selectors(&self) -> Vec<String> {
        self.networks.as_deref().map(parse_list).unwrap_or_default()
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioData {
    pub portfolios: Vec<WalletPortfolio>,
    #[serde(rename = "grandTotalValueUSD")]
    pub grand_total_value_usd: f64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioResponse {
    pub data: PortfolioData,
    pub errors: Vec<PortfolioError>,
    pub status_message: String,
}

impl PortfolioResponse {
    pub fn new(portfolios: Vec<WalletPortfolio>, errors: Vec<PortfolioError>) -> Self {
        let grand_total_value_usd = portfolios.iter().map(|p| p.total_value_usd).sum();
        let status_message = status_message(&portfolios, &errors).to_string();
        Self {
            data: PortfolioData {
                portfolios,
                grand_total_value_usd,
            },
            errors,
            status_message,
        }
    }
}

/// A wallet with no network entries carries no data even though it is listed.
pub fn status_message(portfolios: &[WalletPortfolio], errors: &[PortfolioError]) -> &'static str {
    let has_data = portfolios.iter().any(|p| !p.balances_by_network.is_empty());
    match (has_data, errors.is_empty()) {
        (false, false) => STATUS_TOTAL_FAILURE,
        (true, false) => STATUS_PARTIAL,
        (false, true) => STATUS_EMPTY,
        (true, true) => STATUS_OK,
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedWalletsResponse {
    pub failed_wallets: Vec<String>,
    pub count: usize,
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn get_portfolios(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NetworkQuery>,
) -> ApiResult<Json<PortfolioResponse>> {
    let cancel = state.shutdown.child_token();
    let report = state
        .aggregator
        .fetch_all_tracked(&query.selectors(), &cancel)
        .await?;

    Ok(Json(PortfolioResponse::new(report.portfolios, report.errors)))
}

pub async fn get_failed_wallets(State(state): State<Arc<AppState>>) -> Json<FailedWalletsResponse> {
    let failed_wallets = state.aggregator.failed_wallets();
    let count = failed_wallets.len();
    Json(FailedWalletsResponse { failed_wallets, count })
}

pub async fn get_wallet_portfolio(
    State(state): State<Arc<AppState>>,
    Path(wallet): Path<String>,
    Query(query): Query<NetworkQuery>,
) -> ApiResult<Json<PortfolioResponse>> {
    let cancel = state.shutdown.child_token();
    let (portfolio, errors) = state
        .aggregator
        .fetch_one(&wallet, &query.selectors(), &cancel)
        .await?;

    Ok(Json(PortfolioResponse::new(vec![portfolio], errors)))
}

pub async fn get_wallet_network_portfolio(
    State(state): State<Arc<AppState>>,
    Path((wallet, network)): Path<(String, String)>,
) -> ApiResult<Json<PortfolioResponse>> {
    let cancel = state.shutdown.child_token();
    let (portfolio, errors) = state
        .aggregator
        .fetch_one(&wallet, &[network], &cancel)
        .await?;

    Ok(Json(PortfolioResponse::new(vec![portfolio], errors)))
}

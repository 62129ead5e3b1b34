pub mod error;
pub mod handlers;
pub mod logging;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;

use blockchain::EvmGatewayProvider;
use catalog::{NetworkRegistry, TokenFileLoader, WalletFileLoader};
use portfolio::PortfolioAggregator;
use pricing::{DexScreenerClient, PriceCache};
use shared::config::Config;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Shared state handed to every request handler
pub struct AppState {
    pub aggregator: Arc<PortfolioAggregator>,
    pub prices: Arc<PriceCache>,
    /// Cancelled on shutdown. Each request works on a child token.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(aggregator: Arc<PortfolioAggregator>, shutdown: CancellationToken) -> Self {
        let prices = aggregator.prices().clone();
        Self {
            aggregator,
            prices,
            shutdown,
        }
    }

    /// Wire the file catalogs, the EVM gateways and the DexScreener-backed
    /// price cache described by `config`.
    pub fn from_config(config: &Config, shutdown: CancellationToken) -> anyhow::Result<Self> {
        let networks = Arc::new(NetworkRegistry::with_active(&config.data.active_networks)?);
        let wallets = Arc::new(WalletFileLoader::new(&config.data.wallets_file));
        let tokens = Arc::new(TokenFileLoader::new(&config.data.tokens_dir));

        let feed = Arc::new(DexScreenerClient::new(&config.price_feed)?);
        let prices = Arc::new(PriceCache::new(
            feed,
            networks.clone(),
            tokens.clone(),
            config.price_cache.clone(),
        ));

        let gateways = Arc::new(EvmGatewayProvider::new(config.aggregator.rpc_call_timeout()));

        let aggregator = Arc::new(PortfolioAggregator::new(
            wallets,
            networks,
            tokens,
            gateways,
            prices,
            config.aggregator.clone(),
            config.rate_limit.clone(),
        ));

        Ok(Self::new(aggregator, shutdown))
    }
}

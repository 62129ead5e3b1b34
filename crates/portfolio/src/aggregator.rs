use blockchain::GatewayProvider;
use futures::future::join_all;
use pricing::PriceCache;
use shared::config::{AggregatorConfig, RateLimitConfig};
use shared::units::{format_units, value_usd};
use shared::{
    AssetKind, BalanceRequestItem, BalanceResultItem, Error, NetworkCatalog, NetworkDefinition,
    NetworkTokens, PortfolioError, Result, TokenCatalog, TokenDetail, TokenInfo, Wallet,
    WalletPortfolio, WalletSource,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::rate_limit::TokenBucket;
use crate::selector::resolve_networks;

/// Portfolios of every requested wallet plus every scoped failure
#[derive(Debug, Clone, Default)]
pub struct PortfolioReport {
    /// One entry per requested wallet, in request order
    pub portfolios: Vec<WalletPortfolio>,
    pub errors: Vec<PortfolioError>,
}

/// Computes best-effort wallet portfolios across networks.
///
/// Wallets are processed concurrently up to `max_concurrent_wallets` per
/// call, and each wallet task processes its networks concurrently up to
/// `max_concurrent_networks`. Every wallet×network pair costs one batched
/// gateway call, throttled by a token bucket per chain.
pub struct PortfolioAggregator {
    wallets: Arc<dyn WalletSource>,
    networks: Arc<dyn NetworkCatalog>,
    tokens: Arc<dyn TokenCatalog>,
    gateways: Arc<dyn GatewayProvider>,
    prices: Arc<PriceCache>,
    config: AggregatorConfig,
    rate_limit: RateLimitConfig,
    limiters: Mutex<HashMap<u64, Arc<TokenBucket>>>,
    failed_wallets: Mutex<BTreeSet<String>>,
}

impl PortfolioAggregator {
    pub fn new(
        wallets: Arc<dyn WalletSource>,
        networks: Arc<dyn NetworkCatalog>,
        tokens: Arc<dyn TokenCatalog>,
        gateways: Arc<dyn GatewayProvider>,
        prices: Arc<PriceCache>,
        config: AggregatorConfig,
        rate_limit: RateLimitConfig,
    ) -> Self {
        Self {
            wallets,
            networks,
            tokens,
            gateways,
            prices,
            config,
            rate_limit,
            limiters: Mutex::new(HashMap::new()),
            failed_wallets: Mutex::new(BTreeSet::new()),
        }
    }

    /// Portfolios of every wallet known to the wallet source
    pub async fn fetch_all_tracked(
        &self,
        selectors: &[String],
        cancel: &CancellationToken,
    ) -> Result<PortfolioReport> {
        let wallets = self.wallets.wallets().await?;
        self.fetch_all(&wallets, selectors, cancel).await
    }

    /// Portfolios of `wallets` on the networks named by `selectors`.
    ///
    /// Fails only for an unknown selector or an unreadable token catalog.
    /// Anything else becomes a `PortfolioError` next to partial data.
    pub async fn fetch_all(
        &self,
        wallets: &[Wallet],
        selectors: &[String],
        cancel: &CancellationToken,
    ) -> Result<PortfolioReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("fetch_all", %run_id, wallets = wallets.len());

        async move {
            let started = Instant::now();
            let networks = resolve_networks(&self.networks.networks(), selectors)?;
            let tokens = self.load_tokens(&networks).await?;

            info!(networks = networks.len(), "Fetching portfolios");

            let semaphore = Arc::new(Semaphore::new(self.config.wallet_limit()));
            let tasks = wallets.iter().map(|wallet| {
                let semaphore = semaphore.clone();
                let networks = &networks;
                let tokens = &tokens;
                async move {
                    let permit = tokio::select! {
                        _ = cancel.cancelled() => None,
                        permit = semaphore.acquire_owned() => permit.ok(),
                    };
                    match permit {
                        Some(_permit) if !cancel.is_cancelled() => {
                            self.fetch_wallet(wallet, networks, tokens, cancel).await
                        }
                        _ => (
                            WalletPortfolio::empty(wallet.address.clone()),
                            vec![PortfolioError::wallet(wallet, "cancelled before wallet processing started")],
                        ),
                    }
                }
            });

            let mut report = PortfolioReport::default();
            for (portfolio, errors) in join_all(tasks).await {
                if !errors.is_empty() {
                    self.mark_failed(&portfolio.wallet_address);
                }
                report.portfolios.push(portfolio);
                report.errors.extend(errors);
            }

            info!(
                portfolios = report.portfolios.len(),
                errors = report.errors.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Portfolio fetch complete"
            );

            Ok(report)
        }
        .instrument(span)
        .await
    }

    /// Portfolio of one tracked wallet. An address unknown to the wallet
    /// source is `Error::WalletNotFound`.
    pub async fn fetch_one(
        &self,
        address: &str,
        selectors: &[String],
        cancel: &CancellationToken,
    ) -> Result<(WalletPortfolio, Vec<PortfolioError>)> {
        let wallet = self
            .wallets
            .wallet_by_address(address)
            .await?
            .ok_or_else(|| Error::WalletNotFound(address.to_string()))?;

        let span = info_span!("fetch_one", run_id = %Uuid::new_v4(), wallet = %wallet.address);
        async move {
            let networks = resolve_networks(&self.networks.networks(), selectors)?;
            let tokens = self.load_tokens(&networks).await?;

            let (portfolio, errors) = self.fetch_wallet(&wallet, &networks, &tokens, cancel).await;
            if !errors.is_empty() {
                self.mark_failed(&wallet.address);
            }
            Ok((portfolio, errors))
        }
        .instrument(span)
        .await
    }

    /// Every wallet that has contributed at least one error since startup
    pub fn failed_wallets(&self) -> Vec<String> {
        self.failed_wallets
            .lock()
            .map(|failed| failed.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn prices(&self) -> &Arc<PriceCache> {
        &self.prices
    }

    async fn load_tokens(&self, networks: &[NetworkDefinition]) -> Result<HashMap<u64, Vec<TokenInfo>>> {
        if networks.is_empty() {
            return Ok(HashMap::new());
        }
        self.tokens.tokens_by_network(networks).await
    }

    async fn fetch_wallet(
        &self,
        wallet: &Wallet,
        networks: &[NetworkDefinition],
        tokens: &HashMap<u64, Vec<TokenInfo>>,
        cancel: &CancellationToken,
    ) -> (WalletPortfolio, Vec<PortfolioError>) {
        let semaphore = Arc::new(Semaphore::new(self.config.network_limit()));
        let tasks = networks.iter().map(|network| {
            let semaphore = semaphore.clone();
            let network_tokens = tokens.get(&network.chain_id).map(Vec::as_slice).unwrap_or(&[]);
            async move {
                let permit = tokio::select! {
                    _ = cancel.cancelled() => None,
                    permit = semaphore.acquire_owned() => permit.ok(),
                };
                match permit {
                    Some(_permit) if !cancel.is_cancelled() => {
                        self.fetch_network(wallet, network, network_tokens, cancel).await
                    }
                    _ => (
                        None,
                        vec![PortfolioError::network(wallet, network, "cancelled before network processing started")],
                    ),
                }
            }
        });

        let mut portfolio = WalletPortfolio::empty(wallet.address.clone());
        let mut errors = Vec::new();
        for (network, (entry, network_errors)) in networks.iter().zip(join_all(tasks).await) {
            if let Some(entry) = entry {
                portfolio.insert_network(network.name.clone(), entry);
            }
            errors.extend(network_errors);
        }

        debug!(
            wallet = %wallet.address,
            networks = portfolio.balances_by_network.len(),
            total_value_usd = portfolio.total_value_usd,
            errors = errors.len(),
            "Wallet processed"
        );

        (portfolio, errors)
    }

    async fn fetch_network(
        &self,
        wallet: &Wallet,
        network: &NetworkDefinition,
        tokens: &[TokenInfo],
        cancel: &CancellationToken,
    ) -> (Option<NetworkTokens>, Vec<PortfolioError>) {
        let gateway = match self.gateways.gateway(network) {
            Ok(gateway) => gateway,
            Err(e) => {
                return (
                    None,
                    vec![PortfolioError::network(wallet, network, format!("no gateway: {}", e))],
                )
            }
        };

        let mut requests = Vec::with_capacity(tokens.len() + 1);
        requests.push(BalanceRequestItem::native(wallet, network));
        for token in tokens {
            if token.chain_id != network.chain_id {
                warn!(
                    network = %network.name,
                    token = %token.symbol,
                    token_chain_id = token.chain_id,
                    "Skipping token with mismatched chain id"
                );
                continue;
            }
            requests.push(BalanceRequestItem::token(wallet, network, token));
        }

        let limiter = match self.limiter(network.chain_id) {
            Ok(limiter) => limiter,
            Err(e) => return (None, vec![PortfolioError::network(wallet, network, e.to_string())]),
        };
        if let Err(e) = limiter.acquire(cancel).await {
            let message = match e {
                Error::Cancelled => "cancelled while waiting for rate limit".to_string(),
                other => other.to_string(),
            };
            return (None, vec![PortfolioError::network(wallet, network, message)]);
        }

        let timeout = self.config.rpc_call_timeout();
        let results = tokio::select! {
            _ = cancel.cancelled() => Err(Error::Cancelled),
            outcome = tokio::time::timeout(timeout, gateway.get_balances(&requests)) => match outcome {
                Ok(results) => results,
                Err(_) => Err(Error::EvmRpc(format!("balance call timed out after {:?}", timeout))),
            },
        };

        let results = match results {
            Ok(results) => results,
            Err(e) => {
                warn!(
                    wallet = %wallet.address,
                    network = %network.name,
                    chain_id = network.chain_id,
                    error = %e,
                    "Balance batch failed"
                );
                let message = match e {
                    Error::Cancelled => "cancelled during balance call".to_string(),
                    other => other.to_string(),
                };
                return (None, vec![PortfolioError::network(wallet, network, message)]);
            }
        };

        if results.len() != requests.len() {
            warn!(
                network = %network.name,
                requested = requests.len(),
                returned = results.len(),
                "Gateway returned a different number of results"
            );
        }

        let mut by_id: HashMap<&str, &BalanceResultItem> = results
            .iter()
            .map(|item| (item.request_id.as_str(), item))
            .collect();

        let mut details = Vec::new();
        let mut errors = Vec::new();
        for request in &requests {
            let missing;
            let item = match by_id.remove(request.id.as_str()) {
                Some(item) => item,
                None => {
                    missing = BalanceResultItem::failure(request, "no result returned for request");
                    &missing
                }
            };
            if let Some(message) = &item.error {
                errors.push(PortfolioError::item(wallet, network, item, message.clone()));
                continue;
            }
            if item.amount.is_zero() {
                continue;
            }
            details.push(self.price_item(network, item).await);
        }

        if details.is_empty() {
            return (None, errors);
        }

        (Some(NetworkTokens::from_tokens(network.chain_id, details)), errors)
    }

    async fn price_item(&self, network: &NetworkDefinition, item: &BalanceResultItem) -> TokenDetail {
        let price = match &item.asset {
            AssetKind::Native => self.native_price(network).await,
            AssetKind::Token { address } => self.prices.lookup(&network.price_feed_chain_id, address).await,
        };
        let price_usd = price.unwrap_or(0.0);

        let formatted_balance = if item.formatted_amount.is_empty() {
            format_units(item.amount, item.decimals)
        } else {
            item.formatted_amount.clone()
        };

        TokenDetail {
            token_address: item.asset.token_address().unwrap_or_default().to_string(),
            token_symbol: item.symbol.clone(),
            decimals: item.decimals,
            formatted_balance,
            price_usd,
            value_usd: value_usd(item.amount, item.decimals, price_usd),
        }
    }

    /// Native coins are priced through the shared symbol slot first, then
    /// through the network's wrapped token.
    async fn native_price(&self, network: &NetworkDefinition) -> Option<f64> {
        let symbol = &network.native_symbol;
        if let Some(price) = self.prices.global_native_price(symbol).await {
            return Some(price);
        }

        let Some(wrapped) = network.pricing_proxy_address() else {
            warn!(
                network = %network.name,
                symbol = %symbol,
                "No wrapped native token configured, native value reported as zero"
            );
            return None;
        };

        let price = self.prices.lookup(&network.price_feed_chain_id, &wrapped).await?;
        self.prices.set_global_native_price(symbol, price).await;
        Some(price)
    }

    fn limiter(&self, chain_id: u64) -> Result<Arc<TokenBucket>> {
        let mut limiters = self
            .limiters
            .lock()
            .map_err(|_| Error::Internal("rate limiter registry lock poisoned".to_string()))?;
        Ok(limiters
            .entry(chain_id)
            .or_insert_with(|| Arc::new(TokenBucket::new(&self.rate_limit)))
            .clone())
    }

    fn mark_failed(&self, address: &str) {
        if let Ok(mut failed) = self.failed_wallets.lock() {
            failed.insert(address.to_string());
        }
    }
}

use futures::future::join_all;
use shared::batch::into_batches;
use shared::config::PriceCacheConfig;
use shared::{Error, NetworkCatalog, NetworkDefinition, Result, TokenCatalog};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::price_feed::PriceFeedClient;
use crate::selection::PriceSelectionPolicy;

/// A cached USD price and the moment it was written
#[derive(Debug, Clone, Copy)]
struct PricePoint {
    price: f64,
    stored_at: Instant,
}

impl PricePoint {
    fn is_live(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

/// Outcome counters of one refresh pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub priced: usize,
    pub missed: usize,
    pub failed_batches: usize,
}

impl RefreshSummary {
    fn merge(&mut self, other: RefreshSummary) {
        self.priced += other.priced;
        self.missed += other.missed;
        self.failed_batches += other.failed_batches;
    }
}

/// One outbound price-feed call
struct PriceBatch {
    chain: String,
    addresses: Vec<String>,
}

/// TTL-bound USD price cache keyed by (price-feed chain id, token address).
///
/// Prices are written by `refresh` (or `store`) and read by `lookup`. Only
/// positive finite prices are ever stored, so an absent entry means
/// "unknown", never zero. A secondary slot keyed by native symbol lets a
/// configured set of native coins share one price across chains.
pub struct PriceCache {
    feed: Arc<dyn PriceFeedClient>,
    networks: Arc<dyn NetworkCatalog>,
    tokens: Arc<dyn TokenCatalog>,
    policy: PriceSelectionPolicy,
    config: PriceCacheConfig,
    ttl: Duration,
    global_symbols: HashSet<String>,
    prices: RwLock<HashMap<String, HashMap<String, PricePoint>>>,
    global_native: RwLock<HashMap<String, PricePoint>>,
}

impl PriceCache {
    pub fn new(
        feed: Arc<dyn PriceFeedClient>,
        networks: Arc<dyn NetworkCatalog>,
        tokens: Arc<dyn TokenCatalog>,
        config: PriceCacheConfig,
    ) -> Self {
        let policy = PriceSelectionPolicy::new(&config.stablecoin_symbols);
        let global_symbols = config
            .global_native_symbols
            .iter()
            .map(|symbol| symbol.trim().to_uppercase())
            .filter(|symbol| !symbol.is_empty())
            .collect();

        Self {
            feed,
            networks,
            tokens,
            policy,
            ttl: config.ttl(),
            config,
            global_symbols,
            prices: RwLock::new(HashMap::new()),
            global_native: RwLock::new(HashMap::new()),
        }
    }

    /// Override the configured TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live price of a token, if one was cached and has not expired
    pub async fn lookup(&self, chain: &str, token_address: &str) -> Option<f64> {
        let prices = self.prices.read().await;
        prices
            .get(chain)?
            .get(&token_address.to_lowercase())
            .filter(|point| point.is_live(self.ttl))
            .map(|point| point.price)
    }

    /// Write a price. Returns false, leaving the cache untouched, when the
    /// price is not a positive finite number.
    pub async fn store(&self, chain: &str, token_address: &str, price: f64) -> bool {
        if !is_valid_price(price) {
            debug!(chain, token = token_address, price, "Rejecting non-positive price");
            return false;
        }

        let mut prices = self.prices.write().await;
        prices.entry(chain.to_string()).or_default().insert(
            token_address.to_lowercase(),
            PricePoint {
                price,
                stored_at: Instant::now(),
            },
        );
        true
    }

    pub fn is_global_native_symbol(&self, symbol: &str) -> bool {
        self.global_symbols.contains(&symbol.trim().to_uppercase())
    }

    /// Shared price of a native symbol, if configured as global and still live
    pub async fn global_native_price(&self, symbol: &str) -> Option<f64> {
        if !self.is_global_native_symbol(symbol) {
            return None;
        }
        let slot = self.global_native.read().await;
        slot.get(&symbol.trim().to_uppercase())
            .filter(|point| point.is_live(self.ttl))
            .map(|point| point.price)
    }

    /// Overwrite the shared price of a native symbol. Ignored for symbols
    /// outside the configured set and for non-positive prices.
    pub async fn set_global_native_price(&self, symbol: &str, price: f64) -> bool {
        if !self.is_global_native_symbol(symbol) || !is_valid_price(price) {
            return false;
        }
        let mut slot = self.global_native.write().await;
        slot.insert(
            symbol.trim().to_uppercase(),
            PricePoint {
                price,
                stored_at: Instant::now(),
            },
        );
        true
    }

    /// Copy of every live price, keyed by chain then token address
    pub async fn snapshot(&self) -> HashMap<String, HashMap<String, f64>> {
        let ttl = self.ttl;
        let prices = self.prices.read().await;
        prices
            .iter()
            .map(|(chain, tokens)| {
                let live: HashMap<String, f64> = tokens
                    .iter()
                    .filter(|(_, point)| point.is_live(ttl))
                    .map(|(address, point)| (address.clone(), point.price))
                    .collect();
                (chain.clone(), live)
            })
            .filter(|(_, tokens)| !tokens.is_empty())
            .collect()
    }

    /// Drop expired entries. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let ttl = self.ttl;
        let mut removed = 0;

        let mut prices = self.prices.write().await;
        for tokens in prices.values_mut() {
            let before = tokens.len();
            tokens.retain(|_, point| point.is_live(ttl));
            removed += before - tokens.len();
        }
        prices.retain(|_, tokens| !tokens.is_empty());
        drop(prices);

        let mut slot = self.global_native.write().await;
        let before = slot.len();
        slot.retain(|_, point| point.is_live(ttl));
        removed + before - slot.len()
    }

    /// Re-price every tracked token (and each network's wrapped native
    /// token) of every network that has a price-feed chain id.
    ///
    /// A failed feed batch counts all of its tokens as misses and does not
    /// stop the other batches. Cancellation stops new feed calls and returns
    /// `Error::Cancelled`; prices written before that point are kept.
    pub async fn refresh(&self, cancel: &CancellationToken) -> Result<RefreshSummary> {
        let started = Instant::now();
        let networks: Vec<NetworkDefinition> = self
            .networks
            .networks()
            .into_iter()
            .filter(|network| network.has_price_feed())
            .collect();

        let tokens_by_chain = self.tokens.tokens_by_network(&networks).await?;
        let batch_size = self.config.batch_size().min(self.feed.max_batch_size().max(1));

        let mut batches = Vec::new();
        for network in &networks {
            let mut addresses: BTreeSet<String> = tokens_by_chain
                .get(&network.chain_id)
                .map(|tokens| {
                    tokens
                        .iter()
                        .filter(|token| token.chain_id == network.chain_id)
                        .map(|token| token.address.to_lowercase())
                        .collect()
                })
                .unwrap_or_default();

            if let Some(wrapped) = network.pricing_proxy_address() {
                addresses.insert(wrapped);
            }

            let addresses: Vec<String> = addresses.into_iter().collect();
            for chunk in into_batches(&addresses, batch_size) {
                batches.push(PriceBatch {
                    chain: network.price_feed_chain_id.clone(),
                    addresses: chunk,
                });
            }
        }

        info!(
            networks = networks.len(),
            batches = batches.len(),
            "Refreshing token prices"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.batch_concurrency()));
        let tasks = batches.iter().map(|batch| {
            let semaphore = semaphore.clone();
            async move {
                let _permit = tokio::select! {
                    _ = cancel.cancelled() => return None,
                    permit = semaphore.acquire_owned() => permit.ok()?,
                };
                if cancel.is_cancelled() {
                    return None;
                }
                Some(self.refresh_batch(batch, cancel).await)
            }
        });

        let mut summary = RefreshSummary::default();
        let mut interrupted = false;
        for outcome in join_all(tasks).await {
            match outcome {
                Some(batch_summary) => summary.merge(batch_summary),
                None => interrupted = true,
            }
        }

        if interrupted || cancel.is_cancelled() {
            warn!(
                priced = summary.priced,
                missed = summary.missed,
                "Price refresh cancelled"
            );
            return Err(Error::Cancelled);
        }

        info!(
            priced = summary.priced,
            missed = summary.missed,
            failed_batches = summary.failed_batches,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Price refresh complete"
        );

        Ok(summary)
    }

    async fn refresh_batch(&self, batch: &PriceBatch, cancel: &CancellationToken) -> RefreshSummary {
        let result = tokio::select! {
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = self.feed.get_token_pairs(&batch.chain, &batch.addresses) => result,
        };

        let pairs = match result {
            Ok(pairs) => pairs,
            Err(e) => {
                if e != Error::Cancelled {
                    error!(
                        chain = %batch.chain,
                        tokens = batch.addresses.len(),
                        error = %e,
                        "Price feed batch failed"
                    );
                }
                return RefreshSummary {
                    priced: 0,
                    missed: batch.addresses.len(),
                    failed_batches: 1,
                };
            }
        };

        let mut summary = RefreshSummary::default();
        for address in &batch.addresses {
            match self.policy.select_price(address, &pairs) {
                Some(price) if self.store(&batch.chain, address, price).await => {
                    summary.priced += 1;
                }
                _ => {
                    debug!(chain = %batch.chain, token = %address, "No usable trading pair");
                    summary.missed += 1;
                }
            }
        }
        summary
    }

    /// Run `refresh` now and then every configured interval until `cancel` fires
    pub fn spawn_refresh_loop(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let interval = self.config.refresh_interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let purged = self.purge_expired().await;
                        if purged > 0 {
                            debug!(purged, "Purged expired prices");
                        }
                        if let Err(e) = self.refresh(&cancel).await {
                            if e != Error::Cancelled {
                                error!(error = %e, "Price refresh failed");
                            }
                        }
                    }
                }
            }

            info!("Price refresh loop stopped");
        })
    }
}

fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

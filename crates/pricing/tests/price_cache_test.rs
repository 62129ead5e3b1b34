use async_trait::async_trait;
use pricing::{PriceCache, PriceFeedClient, RefreshSummary, TokenPair};
use shared::config::PriceCacheConfig;
use shared::{Error, NetworkCatalog, NetworkDefinition, Result, TokenCatalog, TokenInfo};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const WETH: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";
const USDC: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
const LINK: &str = "0x514910771af9ca656af840dff83e8264ecf986ca";

/// Feed returning fixed pairs per chain and recording each call
#[derive(Default)]
struct StaticFeed {
    pairs: HashMap<String, Vec<TokenPair>>,
    failing_chains: Vec<String>,
    calls: Mutex<Vec<(String, Vec<String>)>>,
    delay: Option<Duration>,
}

#[async_trait]
impl PriceFeedClient for StaticFeed {
    async fn get_token_pairs(&self, chain_id: &str, addresses: &[String]) -> Result<Vec<TokenPair>> {
        self.calls
            .lock()
            .unwrap()
            .push((chain_id.to_string(), addresses.to_vec()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing_chains.iter().any(|c| c == chain_id) {
            return Err(Error::PriceFeed("upstream unavailable".to_string()));
        }

        Ok(self.pairs.get(chain_id).cloned().unwrap_or_default())
    }

    fn max_batch_size(&self) -> usize {
        2
    }
}

struct StaticNetworks(Vec<NetworkDefinition>);

impl NetworkCatalog for StaticNetworks {
    fn networks(&self) -> Vec<NetworkDefinition> {
        self.0.clone()
    }
}

struct StaticTokens {
    tokens: HashMap<u64, Vec<TokenInfo>>,
    loads: AtomicUsize,
}

#[async_trait]
impl TokenCatalog for StaticTokens {
    async fn tokens_by_network(&self, _networks: &[NetworkDefinition]) -> Result<HashMap<u64, Vec<TokenInfo>>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.tokens.clone())
    }
}

fn network(chain_id: u64, feed_chain: &str, wrapped: Option<&str>) -> NetworkDefinition {
    NetworkDefinition {
        chain_id,
        name: format!("Network {}", chain_id),
        identifier: feed_chain.to_string(),
        native_symbol: "ETH".to_string(),
        native_decimals: 18,
        price_feed_chain_id: feed_chain.to_string(),
        wrapped_native_address: wrapped.map(str::to_string),
        primary_rpc_url: "http://localhost:8545".to_string(),
        fallback_rpc_urls: Vec::new(),
        block_explorer_url: None,
    }
}

fn token(chain_id: u64, address: &str, symbol: &str) -> TokenInfo {
    TokenInfo {
        chain_id,
        address: address.to_string(),
        name: symbol.to_string(),
        symbol: symbol.to_string(),
        decimals: 18,
    }
}

fn pair(base: &str, quote: &str, price: &str, liquidity: f64) -> TokenPair {
    TokenPair {
        base_token_address: base.to_string(),
        quote_token_symbol: quote.to_string(),
        price_usd: price.to_string(),
        liquidity_usd: Some(liquidity),
    }
}

fn cache(feed: StaticFeed, networks: Vec<NetworkDefinition>, tokens: HashMap<u64, Vec<TokenInfo>>) -> (PriceCache, Arc<StaticFeed>) {
    let feed = Arc::new(feed);
    let cache = PriceCache::new(
        feed.clone(),
        Arc::new(StaticNetworks(networks)),
        Arc::new(StaticTokens {
            tokens,
            loads: AtomicUsize::new(0),
        }),
        PriceCacheConfig::default(),
    );
    (cache, feed)
}

#[tokio::test]
async fn test_refresh_then_lookup() {
    let mut feed = StaticFeed::default();
    feed.pairs.insert(
        "ethereum".to_string(),
        vec![
            pair(LINK, "WETH", "2.40", 50_000.0),
            pair(LINK, "USDC", "2.50", 1_000.0),
            pair(WETH, "USDT", "3000", 9_000_000.0),
        ],
    );
    let tokens = HashMap::from([(1, vec![token(1, LINK, "LINK")])]);
    let (cache, _) = cache(feed, vec![network(1, "ethereum", Some(WETH))], tokens);

    let summary = cache.refresh(&CancellationToken::new()).await.unwrap();

    assert_eq!(summary, RefreshSummary { priced: 2, missed: 0, failed_batches: 0 });
    assert_eq!(cache.lookup("ethereum", LINK).await, Some(2.5));
    assert_eq!(cache.lookup("ethereum", &LINK.to_uppercase().replace("0X", "0x")).await, Some(2.5));
    assert_eq!(cache.lookup("ethereum", WETH).await, Some(3000.0));
    assert_eq!(cache.lookup("bsc", LINK).await, None);
}

#[tokio::test]
async fn test_lookup_expires_after_ttl() {
    let (cache, _) = cache(StaticFeed::default(), Vec::new(), HashMap::new());
    let cache = cache.with_ttl(Duration::from_millis(50));

    assert!(cache.store("ethereum", LINK, 2.5).await);
    assert_eq!(cache.lookup("ethereum", LINK).await, Some(2.5));

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(cache.lookup("ethereum", LINK).await, None);
    assert!(cache.snapshot().await.is_empty());
    assert_eq!(cache.purge_expired().await, 1);
}

#[tokio::test]
async fn test_store_rejects_non_positive_prices() {
    let (cache, _) = cache(StaticFeed::default(), Vec::new(), HashMap::new());

    assert!(!cache.store("ethereum", LINK, 0.0).await);
    assert!(!cache.store("ethereum", LINK, -1.0).await);
    assert!(!cache.store("ethereum", LINK, f64::NAN).await);
    assert_eq!(cache.lookup("ethereum", LINK).await, None);
}

#[tokio::test]
async fn test_batches_respect_feed_limit_and_dedupe_wrapped() {
    let tokens = HashMap::from([(
        1,
        vec![token(1, USDC, "USDC"), token(1, LINK, "LINK"), token(1, WETH, "WETH")],
    )]);
    let (cache, feed) = cache(StaticFeed::default(), vec![network(1, "ethereum", Some(WETH))], tokens);

    let summary = cache.refresh(&CancellationToken::new()).await.unwrap();

    let calls = feed.calls.lock().unwrap().clone();
    let requested: usize = calls.iter().map(|(_, addrs)| addrs.len()).sum();
    assert_eq!(requested, 3);
    assert!(calls.iter().all(|(_, addrs)| addrs.len() <= 2));
    assert_eq!(summary.missed, 3);
}

#[tokio::test]
async fn test_failed_batch_does_not_stop_other_networks() {
    let mut feed = StaticFeed::default();
    feed.failing_chains.push("bsc".to_string());
    feed.pairs.insert("ethereum".to_string(), vec![pair(LINK, "USDC", "7.1", 10.0)]);

    let tokens = HashMap::from([
        (1, vec![token(1, LINK, "LINK")]),
        (56, vec![token(56, USDC, "USDC")]),
    ]);
    let networks = vec![network(1, "ethereum", None), network(56, "bsc", None)];
    let (cache, _) = cache(feed, networks, tokens);

    let summary = cache.refresh(&CancellationToken::new()).await.unwrap();

    assert_eq!(summary, RefreshSummary { priced: 1, missed: 1, failed_batches: 1 });
    assert_eq!(cache.lookup("ethereum", LINK).await, Some(7.1));
}

#[tokio::test]
async fn test_networks_without_price_feed_are_skipped() {
    let tokens = HashMap::from([(1, vec![token(1, LINK, "LINK")])]);
    let (cache, feed) = cache(StaticFeed::default(), vec![network(1, "", Some(WETH))], tokens);

    let summary = cache.refresh(&CancellationToken::new()).await.unwrap();

    assert_eq!(summary, RefreshSummary::default());
    assert!(feed.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_mismatched_chain_tokens_are_not_priced() {
    let tokens = HashMap::from([(1, vec![token(56, LINK, "LINK")])]);
    let (cache, feed) = cache(StaticFeed::default(), vec![network(1, "ethereum", None)], tokens);

    cache.refresh(&CancellationToken::new()).await.unwrap();
    assert!(feed.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_global_native_slot() {
    let (cache, _) = cache(StaticFeed::default(), Vec::new(), HashMap::new());

    assert_eq!(cache.global_native_price("ETH").await, None);
    assert!(!cache.set_global_native_price("ETH", 0.0).await);
    assert!(!cache.set_global_native_price("BNB", 600.0).await);
    assert!(cache.set_global_native_price("eth", 3000.0).await);
    assert!(cache.set_global_native_price("ETH", 3100.0).await);

    assert_eq!(cache.global_native_price("ETH").await, Some(3100.0));
    assert_eq!(cache.global_native_price("BNB").await, None);
}

#[tokio::test]
async fn test_refresh_observes_cancellation() {
    let mut feed = StaticFeed::default();
    feed.delay = Some(Duration::from_secs(30));
    let tokens = HashMap::from([(1, vec![token(1, LINK, "LINK")])]);
    let (cache, _) = cache(feed, vec![network(1, "ethereum", None)], tokens);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let result = tokio::time::timeout(Duration::from_secs(5), cache.refresh(&cancel)).await;
    assert!(matches!(result, Ok(Err(Error::Cancelled))));
}

#[tokio::test]
async fn test_concurrent_refresh_and_reads() {
    let mut feed = StaticFeed::default();
    feed.pairs.insert("ethereum".to_string(), vec![pair(LINK, "USDC", "2.5", 10.0)]);
    let tokens = HashMap::from([(1, vec![token(1, LINK, "LINK")])]);
    let (cache, _) = cache(feed, vec![network(1, "ethereum", None)], tokens);
    let cache = Arc::new(cache);

    let cancel = CancellationToken::new();
    let refreshes = (0..4).map(|_| {
        let cache = cache.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { cache.refresh(&cancel).await })
    });
    for handle in refreshes.collect::<Vec<_>>() {
        assert!(handle.await.unwrap().is_ok());
    }

    assert_eq!(cache.lookup("ethereum", LINK).await, Some(2.5));
    assert_eq!(cache.snapshot().await["ethereum"][LINK], 2.5);
}

#[tokio::test]
async fn test_refresh_loop_runs_immediately_and_stops() {
    let mut feed = StaticFeed::default();
    feed.pairs.insert("ethereum".to_string(), vec![pair(LINK, "USDC", "2.5", 10.0)]);
    let tokens = HashMap::from([(1, vec![token(1, LINK, "LINK")])]);
    let (cache, _) = cache(feed, vec![network(1, "ethereum", None)], tokens);
    let cache = Arc::new(cache);

    let cancel = CancellationToken::new();
    let handle = cache.clone().spawn_refresh_loop(cancel.clone());

    let mut priced = false;
    for _ in 0..50 {
        if cache.lookup("ethereum", LINK).await.is_some() {
            priced = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(priced);

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
}

use serde::Deserialize;
use std::env;
use std::time::Duration;

pub const DEFAULT_MAX_TOKENS_PER_BATCH: usize = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub aggregator: AggregatorConfig,
    pub rate_limit: RateLimitConfig,
    pub price_feed: PriceFeedConfig,
    pub price_cache: PriceCacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    pub wallets_file: String,
    pub tokens_dir: String,
    /// Network identifiers to activate. Empty means every built-in network.
    pub active_networks: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AggregatorConfig {
    /// Wallets processed concurrently within one call.
    pub max_concurrent_wallets: usize,
    /// Networks processed concurrently within one wallet task.
    pub max_concurrent_networks: usize,
    pub rpc_call_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Outbound balance batches per second, per network.
    pub requests_per_second: u32,
    pub burst: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceFeedConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub max_tokens_per_batch: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceCacheConfig {
    pub ttl_minutes: u64,
    pub refresh_interval_secs: u64,
    pub max_tokens_per_batch: usize,
    pub max_concurrent_batches: usize,
    /// Quote symbols preferred when selecting among trading pairs.
    pub stablecoin_symbols: Vec<String>,
    /// Native symbols whose price may be shared across chains.
    pub global_native_symbols: Vec<String>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_wallets: 10,
            max_concurrent_networks: 5,
            rpc_call_timeout_secs: 15,
        }
    }
}

impl AggregatorConfig {
    pub fn wallet_limit(&self) -> usize {
        self.max_concurrent_wallets.max(1)
    }

    pub fn network_limit(&self) -> usize {
        self.max_concurrent_networks.max(1)
    }

    pub fn rpc_call_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_call_timeout_secs.max(1))
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10,
            burst: 5,
        }
    }
}

impl Default for PriceFeedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.dexscreener.com".to_string(),
            timeout_ms: 10_000,
            max_tokens_per_batch: DEFAULT_MAX_TOKENS_PER_BATCH,
        }
    }
}

impl PriceFeedConfig {
    pub fn batch_size(&self) -> usize {
        normalize_batch_size(self.max_tokens_per_batch)
    }
}

impl Default for PriceCacheConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: 60,
            refresh_interval_secs: 300,
            max_tokens_per_batch: DEFAULT_MAX_TOKENS_PER_BATCH,
            max_concurrent_batches: 5,
            stablecoin_symbols: vec!["USDC".to_string(), "USDT".to_string(), "DAI".to_string()],
            global_native_symbols: vec!["ETH".to_string()],
        }
    }
}

impl PriceCacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_minutes.saturating_mul(60))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn batch_size(&self) -> usize {
        normalize_batch_size(self.max_tokens_per_batch)
    }

    pub fn batch_concurrency(&self) -> usize {
        self.max_concurrent_batches.max(1)
    }
}

fn normalize_batch_size(size: usize) -> usize {
    if size == 0 {
        DEFAULT_MAX_TOKENS_PER_BATCH
    } else {
        size
    }
}

/// Split a comma separated list, trimming entries and dropping blanks.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()?,
            },
            data: DataConfig {
                wallets_file: env::var("WALLETS_FILE")
                    .unwrap_or_else(|_| "data/wallets.txt".to_string()),
                tokens_dir: env::var("TOKENS_DIR").unwrap_or_else(|_| "data/tokens".to_string()),
                active_networks: parse_list(&env::var("ACTIVE_NETWORKS").unwrap_or_default()),
            },
            aggregator: AggregatorConfig {
                max_concurrent_wallets: env::var("MAX_CONCURRENT_WALLETS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
                max_concurrent_networks: env::var("MAX_CONCURRENT_NETWORKS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()?,
                rpc_call_timeout_secs: env::var("RPC_CALL_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse()?,
            },
            rate_limit: RateLimitConfig {
                requests_per_second: env::var("RPC_RATE_LIMIT_PER_SECOND")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
                burst: env::var("RPC_RATE_LIMIT_BURST")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()?,
            },
            price_feed: PriceFeedConfig {
                base_url: env::var("PRICE_FEED_BASE_URL")
                    .unwrap_or_else(|_| "https://api.dexscreener.com".to_string()),
                timeout_ms: env::var("PRICE_FEED_TIMEOUT_MS")
                    .unwrap_or_else(|_| "10000".to_string())
                    .parse()?,
                max_tokens_per_batch: env::var("PRICE_MAX_TOKENS_PER_BATCH")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()?,
            },
            price_cache: PriceCacheConfig {
                ttl_minutes: env::var("PRICE_CACHE_TTL_MINUTES")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()?,
                refresh_interval_secs: env::var("PRICE_REFRESH_INTERVAL_SECONDS")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()?,
                max_tokens_per_batch: env::var("PRICE_MAX_TOKENS_PER_BATCH")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()?,
                max_concurrent_batches: env::var("PRICE_MAX_CONCURRENT_BATCHES")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()?,
                stablecoin_symbols: parse_list(
                    &env::var("STABLECOIN_SYMBOLS").unwrap_or_else(|_| "USDC,USDT,DAI".to_string()),
                ),
                global_native_symbols: parse_list(
                    &env::var("GLOBAL_NATIVE_SYMBOLS").unwrap_or_else(|_| "ETH".to_string()),
                ),
            },
        })
    }
}

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::config::PriceFeedConfig;
use shared::{Error, Result};
use std::time::Duration;
use tracing::debug;

/// One trading pair as reported by a market-data provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub base_token_address: String,
    pub quote_token_symbol: String,
    /// Raw price string as returned by the provider. May be empty.
    pub price_usd: String,
    pub liquidity_usd: Option<f64>,
}

/// Batched trading-pair lookup. Errors are scoped to the whole batch.
#[async_trait]
pub trait PriceFeedClient: Send + Sync {
    async fn get_token_pairs(&self, chain_id: &str, addresses: &[String]) -> Result<Vec<TokenPair>>;

    /// Largest address list accepted by a single call
    fn max_batch_size(&self) -> usize {
        shared::config::DEFAULT_MAX_TOKENS_PER_BATCH
    }
}

/// DEX Screener API response structures
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DexPair {
    base_token: DexToken,
    quote_token: DexToken,
    #[serde(default)]
    price_usd: Option<String>,
    #[serde(default)]
    liquidity: Option<DexLiquidity>,
}

#[derive(Debug, Deserialize)]
struct DexToken {
    #[serde(default)]
    address: String,
    #[serde(default)]
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct DexLiquidity {
    #[serde(default)]
    usd: Option<f64>,
}

impl From<DexPair> for TokenPair {
    fn from(pair: DexPair) -> Self {
        Self {
            base_token_address: pair.base_token.address,
            quote_token_symbol: pair.quote_token.symbol,
            price_usd: pair.price_usd.unwrap_or_default(),
            liquidity_usd: pair.liquidity.and_then(|l| l.usd),
        }
    }
}

/// DEX Screener HTTP client
pub struct DexScreenerClient {
    client: Client,
    base_url: String,
    max_tokens_per_batch: usize,
}

impl DexScreenerClient {
    pub fn new(config: &PriceFeedConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::PriceFeed(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_tokens_per_batch: config.batch_size(),
        })
    }

    pub fn tokens_url(&self, chain_id: &str, addresses: &[String]) -> String {
        format!("{}/tokens/v1/{}/{}", self.base_url, chain_id, addresses.join(","))
    }
}

#[async_trait]
impl PriceFeedClient for DexScreenerClient {
    async fn get_token_pairs(&self, chain_id: &str, addresses: &[String]) -> Result<Vec<TokenPair>> {
        if addresses.is_empty() {
            return Err(Error::PriceFeed("Token address list is empty".to_string()));
        }

        if addresses.len() > self.max_tokens_per_batch {
            return Err(Error::PriceFeed(format!(
                "Too many token addresses: {} (max {})",
                addresses.len(),
                self.max_tokens_per_batch
            )));
        }

        let url = self.tokens_url(chain_id, addresses);
        debug!(chain = chain_id, tokens = addresses.len(), "Fetching token pairs");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Error::PriceFeed(format!("Failed to fetch token pairs: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::PriceFeed(format!(
                "Price feed returned status {} for chain {}",
                response.status(),
                chain_id
            )));
        }

        let pairs: Vec<DexPair> = response
            .json()
            .await
            .map_err(|e| Error::PriceFeed(format!("Failed to parse token pairs: {}", e)))?;

        Ok(pairs.into_iter().map(TokenPair::from).collect())
    }

    fn max_batch_size(&self) -> usize {
        self.max_tokens_per_batch
    }
}

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// The all-zero address some catalogs use to mark "no contract".
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Decimals assumed for a native coin whose definition leaves them unset.
pub const DEFAULT_NATIVE_DECIMALS: u8 = 18;

/// Validate an Ethereum-compatible address (0x + 40 hex chars) and return
/// its canonical lowercase form.
pub fn validate_evm_address(address: &str) -> Result<String> {
    let address = address.trim();
    if !address.starts_with("0x") && !address.starts_with("0X") {
        return Err(Error::InvalidWalletAddress(format!(
            "{}: address must start with 0x",
            address
        )));
    }

    if address.len() != 42 {
        return Err(Error::InvalidWalletAddress(format!(
            "{}: address must be 42 characters (0x + 40 hex)",
            address
        )));
    }

    if !address[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidWalletAddress(format!(
            "{}: address must contain only hexadecimal characters",
            address
        )));
    }

    Ok(address.to_lowercase())
}

// Wallet models
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub address: String,
}

impl Wallet {
    /// Build a wallet from an unvalidated address string.
    pub fn parse(address: &str) -> Result<Self> {
        Ok(Self {
            address: validate_evm_address(address)?,
        })
    }
}

// Network models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDefinition {
    pub chain_id: u64,
    pub name: String,
    /// Short lowercase key such as "ethereum" or "bsc".
    pub identifier: String,
    pub native_symbol: String,
    pub native_decimals: u8,
    /// Chain identifier used by the market-data provider. Empty when the
    /// network has no price coverage.
    pub price_feed_chain_id: String,
    pub wrapped_native_address: Option<String>,
    pub primary_rpc_url: String,
    #[serde(default)]
    pub fallback_rpc_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_explorer_url: Option<String>,
}

impl NetworkDefinition {
    pub fn effective_native_decimals(&self) -> u8 {
        if self.native_decimals == 0 {
            DEFAULT_NATIVE_DECIMALS
        } else {
            self.native_decimals
        }
    }

    /// Wrapped-native address usable as a pricing proxy, lowercased.
    /// A missing, empty or zero address yields `None`.
    pub fn pricing_proxy_address(&self) -> Option<String> {
        self.wrapped_native_address
            .as_deref()
            .map(str::trim)
            .filter(|addr| !addr.is_empty() && !addr.eq_ignore_ascii_case(ZERO_ADDRESS))
            .map(str::to_lowercase)
    }

    pub fn has_price_feed(&self) -> bool {
        !self.price_feed_chain_id.trim().is_empty()
    }

    /// Primary RPC endpoint followed by the fallbacks, in failover order.
    pub fn rpc_endpoints(&self) -> Vec<String> {
        std::iter::once(self.primary_rpc_url.clone())
            .chain(self.fallback_rpc_urls.iter().cloned())
            .filter(|url| !url.trim().is_empty())
            .collect()
    }
}

// Token models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub chain_id: u64,
    pub address: String,
    #[serde(default)]
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

// Balance request/result models
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetKind {
    Native,
    Token { address: String },
}

impl AssetKind {
    pub fn is_native(&self) -> bool {
        matches!(self, AssetKind::Native)
    }

    pub fn token_address(&self) -> Option<&str> {
        match self {
            AssetKind::Native => None,
            AssetKind::Token { address } => Some(address),
        }
    }
}

/// One unit of work inside a batched balance call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceRequestItem {
    pub id: String,
    pub wallet_address: String,
    pub asset: AssetKind,
    pub symbol: String,
    pub decimals: u8,
}

impl BalanceRequestItem {
    pub fn native(wallet: &Wallet, network: &NetworkDefinition) -> Self {
        Self {
            id: format!("{}-{}-NATIVE", wallet.address, network.identifier),
            wallet_address: wallet.address.clone(),
            asset: AssetKind::Native,
            symbol: network.native_symbol.clone(),
            decimals: network.effective_native_decimals(),
        }
    }

    pub fn token(wallet: &Wallet, network: &NetworkDefinition, token: &TokenInfo) -> Self {
        Self {
            id: format!("{}-{}-{}", wallet.address, network.identifier, token.address),
            wallet_address: wallet.address.clone(),
            asset: AssetKind::Token {
                address: token.address.clone(),
            },
            symbol: token.symbol.clone(),
            decimals: token.decimals,
        }
    }
}

/// Outcome of one request item. `error` is set when this item alone failed;
/// `amount` and `formatted_amount` are meaningless in that case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceResultItem {
    pub request_id: String,
    pub wallet_address: String,
    pub asset: AssetKind,
    pub symbol: String,
    pub decimals: u8,
    pub amount: U256,
    pub formatted_amount: String,
    pub error: Option<String>,
}

impl BalanceResultItem {
    pub fn success(request: &BalanceRequestItem, amount: U256) -> Self {
        Self {
            request_id: request.id.clone(),
            wallet_address: request.wallet_address.clone(),
            asset: request.asset.clone(),
            symbol: request.symbol.clone(),
            decimals: request.decimals,
            amount,
            formatted_amount: crate::units::format_units(amount, request.decimals),
            error: None,
        }
    }

    pub fn failure(request: &BalanceRequestItem, message: impl Into<String>) -> Self {
        Self {
            request_id: request.id.clone(),
            wallet_address: request.wallet_address.clone(),
            asset: request.asset.clone(),
            symbol: request.symbol.clone(),
            decimals: request.decimals,
            amount: U256::ZERO,
            formatted_amount: String::new(),
            error: Some(message.into()),
        }
    }
}

// Portfolio models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDetail {
    /// Empty for the native coin.
    pub token_address: String,
    pub token_symbol: String,
    pub decimals: u8,
    pub formatted_balance: String,
    #[serde(rename = "priceUSD")]
    pub price_usd: f64,
    #[serde(rename = "valueUSD")]
    pub value_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkTokens {
    pub chain_id: u64,
    pub tokens: Vec<TokenDetail>,
    #[serde(rename = "totalValueUSD")]
    pub total_value_usd: f64,
}

impl NetworkTokens {
    /// Build a network entry whose total is the sum of its token values.
    pub fn from_tokens(chain_id: u64, tokens: Vec<TokenDetail>) -> Self {
        let total_value_usd = tokens.iter().map(|t| t.value_usd).sum();
        Self {
            chain_id,
            tokens,
            total_value_usd,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletPortfolio {
    pub wallet_address: String,
    pub balances_by_network: BTreeMap<String, NetworkTokens>,
    #[serde(rename = "totalValueUSD")]
    pub total_value_usd: f64,
}

impl WalletPortfolio {
    pub fn empty(wallet_address: impl Into<String>) -> Self {
        Self {
            wallet_address: wallet_address.into(),
            balances_by_network: BTreeMap::new(),
            total_value_usd: 0.0,
        }
    }

    /// Add (or replace) a network entry and recompute the wallet total.
    pub fn insert_network(&mut self, network_name: impl Into<String>, tokens: NetworkTokens) {
        self.balances_by_network.insert(network_name.into(), tokens);
        self.total_value_usd = self
            .balances_by_network
            .values()
            .map(|network| network.total_value_usd)
            .sum();
    }
}

/// A failure scoped to a wallet and optionally a network and token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioError {
    pub wallet_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_address: Option<String>,
    #[serde(default)]
    pub is_native: bool,
    pub message: String,
}

impl PortfolioError {
    pub fn wallet(wallet: &Wallet, message: impl Into<String>) -> Self {
        Self {
            wallet_address: wallet.address.clone(),
            network_name: None,
            chain_id: None,
            token_symbol: None,
            token_address: None,
            is_native: false,
            message: message.into(),
        }
    }

    pub fn network(wallet: &Wallet, network: &NetworkDefinition, message: impl Into<String>) -> Self {
        Self {
            wallet_address: wallet.address.clone(),
            network_name: Some(network.name.clone()),
            chain_id: Some(network.chain_id),
            token_symbol: None,
            token_address: None,
            is_native: false,
            message: message.into(),
        }
    }

    pub fn item(wallet: &Wallet, network: &NetworkDefinition, item: &BalanceResultItem, message: impl Into<String>) -> Self {
        Self {
            wallet_address: wallet.address.clone(),
            network_name: Some(network.name.clone()),
            chain_id: Some(network.chain_id),
            token_symbol: Some(item.symbol.clone()),
            token_address: item.asset.token_address().map(str::to_string),
            is_native: item.asset.is_native(),
            message: message.into(),
        }
    }
}

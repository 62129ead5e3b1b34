//! Read-only sources of wallets, networks and tracked tokens.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::Result;
use crate::models::{NetworkDefinition, TokenInfo, Wallet};

/// Yields validated wallet addresses.
#[async_trait]
pub trait WalletSource: Send + Sync {
    async fn wallets(&self) -> Result<Vec<Wallet>>;

    /// Case-insensitive lookup of a single wallet.
    async fn wallet_by_address(&self, address: &str) -> Result<Option<Wallet>> {
        let wanted = address.trim().to_lowercase();
        Ok(self
            .wallets()
            .await?
            .into_iter()
            .find(|wallet| wallet.address == wanted))
    }
}

/// Yields the active network definitions.
pub trait NetworkCatalog: Send + Sync {
    fn networks(&self) -> Vec<NetworkDefinition>;
}

/// Yields tracked tokens keyed by chain id. A network missing from the
/// returned map is native-only.
#[async_trait]
pub trait TokenCatalog: Send + Sync {
    async fn tokens_by_network(
        &self,
        networks: &[NetworkDefinition],
    ) -> Result<HashMap<u64, Vec<TokenInfo>>>;
}

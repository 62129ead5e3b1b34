use async_trait::async_trait;
use shared::{BalanceRequestItem, BalanceResultItem, NetworkDefinition, Result};
use std::sync::Arc;

/// Executes batched balance queries against one network.
///
/// On success the returned results are positionally aligned with
/// `requests`, and a failure of a single item is reported through that
/// item's `error`. An `Err` means the whole batch failed.
#[async_trait]
pub trait BlockchainGateway: Send + Sync {
    async fn get_balances(&self, requests: &[BalanceRequestItem]) -> Result<Vec<BalanceResultItem>>;
}

/// Hands out a gateway per network. Implementations are expected to reuse
/// gateway instances across calls.
pub trait GatewayProvider: Send + Sync {
    fn gateway(&self, network: &NetworkDefinition) -> Result<Arc<dyn BlockchainGateway>>;
}

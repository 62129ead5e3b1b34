use shared::{Error, NetworkDefinition, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

use crate::evm_client::EvmClient;
use crate::gateway::{BlockchainGateway, GatewayProvider};

/// Multi-chain gateway provider
///
/// Builds one `EvmClient` per chain id on first use and hands out the same
/// instance afterwards.
pub struct EvmGatewayProvider {
    timeout: Duration,
    clients: Mutex<HashMap<u64, Arc<EvmClient>>>,
}

impl EvmGatewayProvider {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Number of clients built so far
    pub fn client_count(&self) -> usize {
        self.clients.lock().map(|clients| clients.len()).unwrap_or(0)
    }
}

impl GatewayProvider for EvmGatewayProvider {
    fn gateway(&self, network: &NetworkDefinition) -> Result<Arc<dyn BlockchainGateway>> {
        let mut clients = self
            .clients
            .lock()
            .map_err(|_| Error::Internal("EVM client registry lock poisoned".to_string()))?;

        if let Some(client) = clients.get(&network.chain_id) {
            return Ok(client.clone());
        }

        debug!(chain_id = network.chain_id, network = %network.name, "Creating EVM client");
        let client = Arc::new(EvmClient::new(network, self.timeout)?);
        clients.insert(network.chain_id, client.clone());
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network(chain_id: u64) -> NetworkDefinition {
        NetworkDefinition {
            chain_id,
            name: format!("Chain {}", chain_id),
            identifier: format!("chain{}", chain_id),
            native_symbol: "ETH".to_string(),
            native_decimals: 18,
            price_feed_chain_id: String::new(),
            wrapped_native_address: None,
            primary_rpc_url: "https://rpc.example.org".to_string(),
            fallback_rpc_urls: Vec::new(),
            block_explorer_url: None,
        }
    }

    #[test]
    fn test_gateways_are_memoized_per_chain() {
        let provider = EvmGatewayProvider::new(Duration::from_secs(5));

        let first = provider.gateway(&network(1)).unwrap();
        let again = provider.gateway(&network(1)).unwrap();
        provider.gateway(&network(56)).unwrap();

        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(provider.client_count(), 2);
    }

    #[test]
    fn test_failed_construction_is_not_cached() {
        let provider = EvmGatewayProvider::new(Duration::from_secs(5));
        let mut broken = network(10);
        broken.primary_rpc_url = String::new();

        assert!(provider.gateway(&broken).is_err());
        assert_eq!(provider.client_count(), 0);
    }
}

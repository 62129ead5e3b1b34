use shared::{Error, NetworkCatalog, NetworkDefinition, Result};
use tracing::info;

struct BuiltinNetwork {
    chain_id: u64,
    name: &'static str,
    identifier: &'static str,
    native_symbol: &'static str,
    price_feed_chain_id: &'static str,
    wrapped_native_address: &'static str,
    primary_rpc_url: &'static str,
    fallback_rpc_urls: &'static [&'static str],
    block_explorer_url: &'static str,
}

const BUILTIN_NETWORKS: &[BuiltinNetwork] = &[
    BuiltinNetwork {
        chain_id: 1,
        name: "Ethereum Mainnet",
        identifier: "ethereum",
        native_symbol: "ETH",
        price_feed_chain_id: "ethereum",
        wrapped_native_address: "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2",
        primary_rpc_url: "https://ethereum-rpc.publicnode.com",
        fallback_rpc_urls: &["https://rpc.ankr.com/eth", "https://ethereum.publicnode.com"],
        block_explorer_url: "https://etherscan.io",
    },
    BuiltinNetwork {
        chain_id: 56,
        name: "BNB Smart Chain",
        identifier: "bsc",
        native_symbol: "BNB",
        price_feed_chain_id: "bsc",
        wrapped_native_address: "0xbb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c",
        primary_rpc_url: "https://1rpc.io/bnb",
        fallback_rpc_urls: &["https://bsc-dataseed2.binance.org/", "https://bsc.publicnode.com"],
        block_explorer_url: "https://bscscan.com",
    },
    BuiltinNetwork {
        chain_id: 137,
        name: "Polygon PoS",
        identifier: "polygon",
        native_symbol: "MATIC",
        price_feed_chain_id: "polygon",
        wrapped_native_address: "0x0d500b1d8e8ef31e21c99d1db9a6444d3adf1270",
        primary_rpc_url: "https://polygon-rpc.com/",
        fallback_rpc_urls: &["https://rpc.ankr.com/polygon", "https://polygon.publicnode.com"],
        block_explorer_url: "https://polygonscan.com",
    },
    BuiltinNetwork {
        chain_id: 42161,
        name: "Arbitrum One",
        identifier: "arbitrum",
        native_symbol: "ETH",
        price_feed_chain_id: "arbitrum",
        wrapped_native_address: "0x82af49447d8a07e3bd95bd0d56f35241523fbab1",
        primary_rpc_url: "https://arb1.arbitrum.io/rpc",
        fallback_rpc_urls: &["https://arbitrum.llamarpc.com", "https://arbitrum.publicnode.com"],
        block_explorer_url: "https://arbiscan.io",
    },
    BuiltinNetwork {
        chain_id: 43114,
        name: "Avalanche C-Chain",
        identifier: "avalanche",
        native_symbol: "AVAX",
        price_feed_chain_id: "avalanche",
        wrapped_native_address: "0xb31f66aa3c1e785363f0875a1b74e27b85fd66c7",
        primary_rpc_url: "https://api.avax.network/ext/bc/C/rpc",
        fallback_rpc_urls: &["https://avalanche.public-rpc.com", "https://rpc.ankr.com/avalanche"],
        block_explorer_url: "https://snowtrace.io",
    },
    BuiltinNetwork {
        chain_id: 8453,
        name: "Base Mainnet",
        identifier: "base",
        native_symbol: "ETH",
        price_feed_chain_id: "base",
        wrapped_native_address: "0x4200000000000000000000000000000000000006",
        primary_rpc_url: "https://1rpc.io/base",
        fallback_rpc_urls: &["https://base.publicnode.com", "https://base.llamarpc.com"],
        block_explorer_url: "https://basescan.org",
    },
    BuiltinNetwork {
        chain_id: 10,
        name: "OP Mainnet",
        identifier: "optimism",
        native_symbol: "ETH",
        price_feed_chain_id: "optimism",
        wrapped_native_address: "0x4200000000000000000000000000000000000006",
        primary_rpc_url: "https://op-pokt.nodies.app",
        fallback_rpc_urls: &["https://optimism.publicnode.com", "https://rpc.ankr.com/optimism"],
        block_explorer_url: "https://optimistic.etherscan.io",
    },
];

impl BuiltinNetwork {
    fn definition(&self) -> NetworkDefinition {
        NetworkDefinition {
            chain_id: self.chain_id,
            name: self.name.to_string(),
            identifier: self.identifier.to_string(),
            native_symbol: self.native_symbol.to_string(),
            native_decimals: 18,
            price_feed_chain_id: self.price_feed_chain_id.to_string(),
            wrapped_native_address: Some(self.wrapped_native_address.to_string()),
            primary_rpc_url: self.primary_rpc_url.to_string(),
            fallback_rpc_urls: self.fallback_rpc_urls.iter().map(|url| url.to_string()).collect(),
            block_explorer_url: Some(self.block_explorer_url.to_string()),
        }
    }
}

/// Static set of active network definitions
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    networks: Vec<NetworkDefinition>,
}

impl NetworkRegistry {
    /// Every built-in network
    pub fn builtin() -> Self {
        Self {
            networks: BUILTIN_NETWORKS.iter().map(BuiltinNetwork::definition).collect(),
        }
    }

    /// Built-in networks narrowed to `identifiers`, in the given order.
    /// An empty list activates every built-in network.
    pub fn with_active<S: AsRef<str>>(identifiers: &[S]) -> Result<Self> {
        if identifiers.is_empty() {
            return Ok(Self::builtin());
        }

        let all = Self::builtin();
        let mut networks: Vec<NetworkDefinition> = Vec::with_capacity(identifiers.len());
        for identifier in identifiers {
            let identifier = identifier.as_ref().trim();
            let network = all
                .find(identifier)
                .ok_or_else(|| Error::Config(format!("Unknown network identifier: {}", identifier)))?;
            if !networks.iter().any(|n| n.chain_id == network.chain_id) {
                networks.push(network.clone());
            }
        }

        info!(
            active = ?networks.iter().map(|n| n.identifier.as_str()).collect::<Vec<_>>(),
            "Activated networks"
        );
        Ok(Self { networks })
    }

    pub fn from_definitions(networks: Vec<NetworkDefinition>) -> Self {
        Self { networks }
    }

    /// Case-insensitive lookup by identifier
    pub fn find(&self, identifier: &str) -> Option<&NetworkDefinition> {
        self.networks
            .iter()
            .find(|network| network.identifier.eq_ignore_ascii_case(identifier))
    }
}

impl NetworkCatalog for NetworkRegistry {
    fn networks(&self) -> Vec<NetworkDefinition> {
        self.networks.clone()
    }
}

pub mod evm_client;
pub mod gateway;
pub mod multi_chain;
pub mod types;

pub use evm_client::EvmClient;
pub use gateway::{BlockchainGateway, GatewayProvider};
pub use multi_chain::EvmGatewayProvider;
pub use types::*;

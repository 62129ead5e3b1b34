//! File-backed and built-in sources of wallets, tokens and networks.

pub mod network_registry;
pub mod token_loader;
pub mod wallet_loader;

pub use network_registry::NetworkRegistry;
pub use token_loader::TokenFileLoader;
pub use wallet_loader::WalletFileLoader;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    #[error("Wallet not found: {0}")]
    WalletNotFound(String),

    #[error("Invalid wallet address: {0}")]
    InvalidWalletAddress(String),

    #[error("EVM RPC error: {0}")]
    EvmRpc(String),

    #[error("Price feed error: {0}")]
    PriceFeed(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

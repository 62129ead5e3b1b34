pub mod batch;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod units;

pub use catalog::{NetworkCatalog, TokenCatalog, WalletSource};
pub use error::{Error, Result};
pub use models::*;

pub mod aggregator;
pub mod rate_limit;
pub mod selector;

pub use aggregator::{PortfolioAggregator, PortfolioReport};
pub use rate_limit::TokenBucket;
pub use selector::resolve_networks;

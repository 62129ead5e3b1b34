pub mod price_cache;
pub mod price_feed;
pub mod selection;

pub use price_cache::{PriceCache, RefreshSummary};
pub use price_feed::{DexScreenerClient, PriceFeedClient, TokenPair};
pub use selection::PriceSelectionPolicy;

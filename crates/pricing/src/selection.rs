//! Choosing one USD price among several trading pairs of the same token.

use std::collections::HashSet;

use crate::price_feed::TokenPair;

/// Stablecoin-first, liquidity-second pair selection.
///
/// Pairs with an empty or `"0"` price are ignored. Stablecoin-quoted pairs
/// win over any other pair; within a group the pair with the highest USD
/// liquidity wins, missing liquidity counting as zero and ties going to the
/// earliest pair.
#[derive(Debug, Clone)]
pub struct PriceSelectionPolicy {
    stablecoins: HashSet<String>,
}

impl PriceSelectionPolicy {
    pub fn new<S: AsRef<str>>(stablecoins: &[S]) -> Self {
        Self {
            stablecoins: stablecoins
                .iter()
                .map(|symbol| symbol.as_ref().trim().to_uppercase())
                .filter(|symbol| !symbol.is_empty())
                .collect(),
        }
    }

    pub fn is_stablecoin(&self, symbol: &str) -> bool {
        self.stablecoins.contains(&symbol.trim().to_uppercase())
    }

    pub fn select<'a>(&self, pairs: &'a [TokenPair]) -> Option<&'a TokenPair> {
        let eligible: Vec<&TokenPair> = pairs
            .iter()
            .filter(|pair| {
                let price = pair.price_usd.trim();
                !price.is_empty() && price != "0"
            })
            .collect();

        let stable = highest_liquidity(
            eligible
                .iter()
                .copied()
                .filter(|pair| self.is_stablecoin(&pair.quote_token_symbol)),
        );

        stable.or_else(|| highest_liquidity(eligible.iter().copied()))
    }

    /// Select among the pairs whose base token is `token_address` and parse
    /// the winner. A winner whose price does not parse to a positive finite
    /// number counts as no price.
    pub fn select_price(&self, token_address: &str, pairs: &[TokenPair]) -> Option<f64> {
        let matching: Vec<TokenPair> = pairs
            .iter()
            .filter(|pair| pair.base_token_address.eq_ignore_ascii_case(token_address))
            .cloned()
            .collect();

        let winner = self.select(&matching)?;
        winner
            .price_usd
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|price| price.is_finite() && *price > 0.0)
    }
}

fn highest_liquidity<'a>(pairs: impl Iterator<Item = &'a TokenPair>) -> Option<&'a TokenPair> {
    let mut best: Option<&TokenPair> = None;
    for pair in pairs {
        let liquidity = pair.liquidity_usd.unwrap_or(0.0);
        match best {
            Some(current) if liquidity <= current.liquidity_usd.unwrap_or(0.0) => {}
            _ => best = Some(pair),
        }
    }
    best
}

//! Conversions between raw on-chain integers and human-readable amounts.

use alloy_primitives::{utils, U256};

/// Render `amount / 10^decimals` as a plain decimal string with trailing
/// fractional zeros removed. The conversion is exact.
pub fn format_units(amount: U256, decimals: u8) -> String {
    match utils::format_units(amount, decimals) {
        Ok(formatted) => trim_fraction(&formatted),
        // alloy's `Unit` stops at 77 decimals
        Err(_) => format_wide_units(amount, decimals),
    }
}

fn trim_fraction(formatted: &str) -> String {
    match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                whole.to_string()
            } else {
                format!("{}.{}", whole, fraction)
            }
        }
        None => formatted.to_string(),
    }
}

fn format_wide_units(amount: U256, decimals: u8) -> String {
    let digits = amount.to_string();
    let decimals = decimals as usize;
    let padded = format!("{}{}", "0".repeat((decimals + 1).saturating_sub(digits.len())), digits);
    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    trim_fraction(&format!("{}.{}", whole, fraction))
}

/// Approximate a raw amount as an `f64` of whole units. Precision loss only
/// happens in the float step, after the exact decimal rendering.
pub fn amount_to_f64(amount: U256, decimals: u8) -> f64 {
    format_units(amount, decimals).parse().unwrap_or(0.0)
}

/// USD value of a raw amount at the given unit price.
pub fn value_usd(amount: U256, decimals: u8, price_usd: f64) -> f64 {
    if price_usd <= 0.0 || amount.is_zero() {
        return 0.0;
    }
    amount_to_f64(amount, decimals) * price_usd
}

/// Parse a 0x-prefixed hex quantity as returned by JSON-RPC. `0x` and the
/// empty string read as zero.
pub fn parse_hex_quantity(raw: &str) -> Option<U256> {
    let hex = raw
        .trim()
        .strip_prefix("0x")
        .or_else(|| raw.trim().strip_prefix("0X"))?;
    if hex.is_empty() {
        return Some(U256::ZERO);
    }
    U256::from_str_radix(hex, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_whole_units() {
        let one_eth = U256::from(1_000_000_000_000_000_000u128);
        assert_eq!(format_units(one_eth, 18), "1");
    }

    #[test]
    fn test_format_fractional_units() {
        assert_eq!(format_units(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_units(U256::from(1u64), 6), "0.000001");
        assert_eq!(format_units(U256::from(123_456_789u64), 0), "123456789");
    }

    #[test]
    fn test_format_beyond_alloy_unit_range() {
        assert_eq!(format_units(U256::from(5u64), 80), format!("0.{}5", "0".repeat(79)));
        assert_eq!(format_units(U256::ZERO, 80), "0");
    }

    #[test]
    fn test_format_keeps_integer_zeros() {
        assert_eq!(format_units(U256::from(1_000u64), 0), "1000");
        assert_eq!(format_units(U256::from(100_000_000u64), 6), "100");
    }

    #[test]
    fn test_format_zero() {
        assert_eq!(format_units(U256::ZERO, 18), "0");
    }

    #[test]
    fn test_format_max_uint256_is_exact() {
        let formatted = format_units(U256::MAX, 18);
        assert!(formatted.starts_with("115792089237316195423570985008687907853269984665640564039457"));
        assert!(formatted.contains('.'));
    }

    #[test]
    fn test_value_usd() {
        let amount = U256::from(2_500_000u64);
        assert!((value_usd(amount, 6, 2.0) - 5.0).abs() < 1e-9);
        assert_eq!(value_usd(amount, 6, 0.0), 0.0);
    }

    #[test]
    fn test_parse_hex_quantity() {
        assert_eq!(parse_hex_quantity("0x"), Some(U256::ZERO));
        assert_eq!(parse_hex_quantity("0x0de0b6b3a7640000"), Some(U256::from(1_000_000_000_000_000_000u128)));
        assert_eq!(parse_hex_quantity("0xzz"), None);
        assert_eq!(parse_hex_quantity("1234"), None);
    }

    proptest! {
        #[test]
        fn prop_format_units_preserves_digits(raw in any::<u128>(), decimals in 0u8..90) {
            let formatted = format_units(U256::from(raw), decimals);
            let digits: String = formatted.chars().filter(|c| *c != '.').collect();
            let trimmed = digits.trim_start_matches('0');
            let expected = raw.to_string();
            let expected = expected.trim_end_matches('0');
            prop_assert!(trimmed.trim_end_matches('0') == expected);
            prop_assert!(!formatted.ends_with('.'));
        }
    }
}

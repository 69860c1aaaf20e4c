//! Conversions between display amounts and wei

use crate::{Error, Result};
use alloy::primitives::U256;

/// Decimal places between ether and wei
pub const WEI_DECIMALS: u32 = 18;

/// Parse a decimal ether amount ("1.5") into wei
pub fn parse_ether(amount: &str) -> Result<U256> {
    alloy::primitives::utils::parse_ether(amount.trim())
        .map_err(|e| Error::InvalidInput(format!("Invalid amount '{}': {}", amount, e)))
}

/// Format a U256 value with decimals
///
/// Trailing zeros are dropped so amounts read the way they were typed
/// ("1.5", not "1.500000000000000000").
pub fn format_units(value: U256, decimals: u32) -> String {
    if value.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10).pow(U256::from(decimals));
    let whole = value / divisor;
    let remainder = value % divisor;

    if remainder.is_zero() {
        return whole.to_string();
    }

    let remainder_str = format!("{:0>width$}", remainder, width = decimals as usize);
    let trimmed = remainder_str.trim_end_matches('0');
    if trimmed.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, trimmed)
    }
}

pub fn format_ether(wei: U256) -> String {
    format_units(wei, WEI_DECIMALS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_units() {
        let one_eth = U256::from(1_000_000_000_000_000_000u128);
        assert_eq!(format_units(one_eth, 18), "1");

        let one_point_five = U256::from(1_500_000_000_000_000_000u128);
        assert_eq!(format_units(one_point_five, 18), "1.5");

        // 1 wei keeps every leading zero of the fraction
        assert_eq!(format_units(U256::from(1u8), 18), "0.000000000000000001");

        assert_eq!(format_units(U256::ZERO, 18), "0");
    }

    #[test]
    fn test_parse_ether() {
        assert_eq!(
            parse_ether("1.5").unwrap(),
            U256::from(1_500_000_000_000_000_000u128)
        );
        assert_eq!(parse_ether(" 2 ").unwrap(), U256::from(2_000_000_000_000_000_000u128));
        assert_eq!(format_ether(parse_ether("0.01").unwrap()), "0.01");
    }

    #[test]
    fn test_parse_ether_rejects_garbage() {
        assert!(matches!(parse_ether("abc"), Err(Error::InvalidInput(_))));
        assert!(matches!(parse_ether("1.2.3"), Err(Error::InvalidInput(_))));
    }
}

//! Input validation and display formatting
//!
//! Validation returns [`BridgeError`] variants whose messages can be shown
//! next to the offending field as they are.

use alloy_primitives::Address;

use crate::chain::ChainId;
use crate::error::{BridgeError, Result};
use crate::stellar::StellarAddress;

/// Slippage bounds in percent.
pub const MIN_SLIPPAGE_PERCENT: f64 = 0.1;
pub const MAX_SLIPPAGE_PERCENT: f64 = 5.0;

fn invalid_address(reason: &str) -> BridgeError {
    BridgeError::InvalidAddress {
        reason: reason.to_string(),
    }
}

fn invalid_amount(reason: impl Into<String>) -> BridgeError {
    BridgeError::InvalidAmount {
        reason: reason.into(),
    }
}

/// A Solana address is a base58-encoded 32-byte public key.
fn is_solana_address(address: &str) -> bool {
    bs58::decode(address)
        .into_vec()
        .is_ok_and(|bytes| bytes.len() == 32)
}

/// Validates a destination address for a chain and returns its canonical
/// form.
///
/// EVM addresses come back EIP-55 checksummed. Mixed-case input must
/// already carry a valid checksum; all-lowercase or all-uppercase input is
/// accepted as is.
///
/// ```rust
/// use rozo_bridge::validation::validate_address;
/// use rozo_bridge::ChainId;
///
/// let address = validate_address("0x742d35cc6634c0532925a3b844bc9e7595f8fa0d", ChainId::Base)?;
/// assert_eq!(address, "0x742d35Cc6634c0532925A3b844Bc9e7595f8fa0d");
/// # Ok::<(), rozo_bridge::BridgeError>(())
/// ```
pub fn validate_address(address: &str, chain: ChainId) -> Result<String> {
    if address.is_empty() {
        return Err(invalid_address("Address is required"));
    }

    if chain.is_solana() {
        return if is_solana_address(address) {
            Ok(address.to_string())
        } else {
            Err(invalid_address("Invalid Solana address format"))
        };
    }

    if chain.is_stellar() {
        return StellarAddress::parse(address)
            .map(|a| a.to_string())
            .map_err(|_| invalid_address("Invalid Stellar address format"));
    }

    let hex = address
        .strip_prefix("0x")
        .filter(|hex| hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit()))
        .ok_or_else(|| invalid_address("Invalid Ethereum address format"))?;

    let mixed_case =
        hex.bytes().any(|b| b.is_ascii_lowercase()) && hex.bytes().any(|b| b.is_ascii_uppercase());
    let parsed = if mixed_case {
        Address::parse_checksummed(address, None)
            .map_err(|_| invalid_address("Invalid address checksum"))?
    } else {
        address
            .parse::<Address>()
            .map_err(|_| invalid_address("Invalid Ethereum address format"))?
    };
    Ok(parsed.to_checksum(None))
}

/// Whether `address` is a valid destination on `chain`.
pub fn is_valid_address(address: &str, chain: ChainId) -> bool {
    validate_address(address, chain).is_ok()
}

/// Validates a transfer amount against an optional balance and minimum.
///
/// Returns the parsed amount.
pub fn validate_amount(amount: &str, balance: Option<&str>, min_amount: Option<&str>) -> Result<f64> {
    let amount = amount.trim();
    if amount.is_empty() || amount == "0" {
        return Err(invalid_amount("Amount must be greater than 0"));
    }

    let value: f64 = amount
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite() && *v > 0.0)
        .ok_or_else(|| invalid_amount("Invalid amount"))?;

    if let Some(min) = min_amount.and_then(|m| m.trim().parse::<f64>().ok()) {
        if value < min {
            return Err(invalid_amount(format!(
                "Minimum amount is {}",
                min_amount.unwrap_or_default().trim()
            )));
        }
    }

    if let Some(balance) = balance.and_then(|b| b.trim().parse::<f64>().ok()) {
        if value > balance {
            return Err(invalid_amount("Insufficient balance"));
        }
    }

    Ok(value)
}

/// Slippage must be within 0.1% and 5.0% inclusive.
pub fn validate_slippage(slippage_percent: f64) -> Result<()> {
    if !(MIN_SLIPPAGE_PERCENT..=MAX_SLIPPAGE_PERCENT).contains(&slippage_percent) {
        return Err(invalid_amount("Slippage must be between 0.1% and 5.0%"));
    }
    Ok(())
}

pub fn validate_chain_selection(from: Option<ChainId>, to: Option<ChainId>) -> Result<()> {
    let (Some(from), Some(to)) = (from, to) else {
        return Err(BridgeError::UnsupportedRoute {
            reason: "Please select both source and destination chains".to_string(),
        });
    };
    if from == to {
        return Err(BridgeError::UnsupportedRoute {
            reason: "Source and destination chains must be different".to_string(),
        });
    }
    Ok(())
}

/// Cleans up a pasted address.
///
/// ENS names are lowercased and bare 40-digit hex gets a `0x` prefix.
pub fn format_pasted_address(input: &str) -> String {
    let cleaned = input.trim();
    if cleaned.to_ascii_lowercase().ends_with(".eth") {
        return cleaned.to_lowercase();
    }
    if cleaned.starts_with("0x") {
        return cleaned.to_string();
    }
    if cleaned.len() == 40 && cleaned.bytes().all(|b| b.is_ascii_hexdigit()) {
        return format!("0x{cleaned}");
    }
    cleaned.to_string()
}

/// Formats a token amount for display.
///
/// Dust keeps `decimals` places, amounts under 1000 keep up to four, and
/// larger amounts use K/M suffixes. Unparseable input renders as `"0"`.
pub fn format_token_amount(amount: &str, decimals: usize) -> String {
    let Ok(value) = amount.trim().parse::<f64>() else {
        return "0".to_string();
    };
    if value.is_nan() {
        return "0".to_string();
    }

    if value < 0.01 {
        format!("{value:.decimals$}")
    } else if value < 1000.0 {
        format!("{value:.prec$}", prec = decimals.min(4))
    } else if value >= 1_000_000.0 {
        format!("{:.2}M", value / 1_000_000.0)
    } else {
        format!("{:.2}K", value / 1000.0)
    }
}

/// Formats a USD amount with grouping, two to six fraction digits.
///
/// ```rust
/// use rozo_bridge::validation::format_usd_amount;
///
/// assert_eq!(format_usd_amount("1234.5"), "$1,234.50");
/// assert_eq!(format_usd_amount("0.0001234"), "$0.000123");
/// ```
pub fn format_usd_amount(amount: &str) -> String {
    let Some(value) = amount.trim().parse::<f64>().ok().filter(|v| v.is_finite()) else {
        return "$0.00".to_string();
    };

    let fixed = format!("{:.6}", value.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let mut fraction = fraction.trim_end_matches('0').to_string();
    while fraction.len() < 2 {
        fraction.push('0');
    }

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{fraction}")
}

/// Formats seconds as `45s`, `12m`, `2h 5m` or `3d 4h`.
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds}s");
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m");
    }
    let hours = minutes / 60;
    let remaining_minutes = minutes % 60;
    if hours < 24 {
        return if remaining_minutes > 0 {
            format!("{hours}h {remaining_minutes}m")
        } else {
            format!("{hours}h")
        };
    }
    let days = hours / 24;
    let remaining_hours = hours % 24;
    if remaining_hours > 0 {
        format!("{days}d {remaining_hours}h")
    } else {
        format!("{days}d")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn reason(err: BridgeError) -> String {
        match err {
            BridgeError::InvalidAddress { reason }
            | BridgeError::InvalidAmount { reason }
            | BridgeError::UnsupportedRoute { reason } => reason,
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[rstest]
    #[case("", ChainId::Base, "Address is required")]
    #[case("0x1234", ChainId::Base, "Invalid Ethereum address format")]
    #[case("742d35Cc6634C0532925a3b844Bc9e7595f8fA0d", ChainId::Base, "Invalid Ethereum address format")]
    #[case("0x742d35Cc6634C0532925a3b844Bc9e7595f8fA0d", ChainId::Base, "Invalid address checksum")]
    #[case("0OIl", ChainId::Solana, "Invalid Solana address format")]
    #[case("zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz", ChainId::Solana, "Invalid Solana address format")]
    #[case("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1vEPjF", ChainId::Solana, "Invalid Solana address format")]
    #[case("11111111111111111111111111111111111111111111", ChainId::Solana, "Invalid Solana address format")]
    #[case("GABC", ChainId::Stellar, "Invalid Stellar address format")]
    fn test_invalid_addresses(#[case] address: &str, #[case] chain: ChainId, #[case] expected: &str) {
        assert_eq!(reason(validate_address(address, chain).unwrap_err()), expected);
    }

    #[rstest]
    #[case("0x742d35Cc6634c0532925A3b844Bc9e7595f8fa0d", ChainId::Ethereum)]
    #[case("0x742D35CC6634C0532925A3B844BC9E7595F8FA0D", ChainId::Polygon)]
    #[case("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", ChainId::Solana)]
    #[case("11111111111111111111111111111111", ChainId::Solana)]
    #[case("GA5ZSEJYB37JRC5AVCIA5MOP4RHTM335X2KGX3IHOJAPP5RE34K4KZVN", ChainId::Stellar)]
    fn test_valid_addresses(#[case] address: &str, #[case] chain: ChainId) {
        assert!(is_valid_address(address, chain));
    }

    #[rstest]
    #[case("", None, None, "Amount must be greater than 0")]
    #[case("0", None, None, "Amount must be greater than 0")]
    #[case("abc", None, None, "Invalid amount")]
    #[case("-1", None, None, "Invalid amount")]
    #[case("0.5", None, Some("1"), "Minimum amount is 1")]
    #[case("12", Some("10"), None, "Insufficient balance")]
    fn test_invalid_amounts(
        #[case] amount: &str,
        #[case] balance: Option<&str>,
        #[case] min: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(reason(validate_amount(amount, balance, min).unwrap_err()), expected);
    }

    #[test]
    fn test_valid_amount() {
        assert_eq!(validate_amount("10", Some("10"), Some("1")).unwrap(), 10.0);
    }

    #[rstest]
    #[case(0.1, true)]
    #[case(5.0, true)]
    #[case(0.09, false)]
    #[case(5.1, false)]
    fn test_slippage_bounds(#[case] slippage: f64, #[case] ok: bool) {
        assert_eq!(validate_slippage(slippage).is_ok(), ok);
    }

    #[test]
    fn test_chain_selection() {
        assert!(validate_chain_selection(Some(ChainId::Base), Some(ChainId::Stellar)).is_ok());
        assert_eq!(
            reason(validate_chain_selection(Some(ChainId::Base), None).unwrap_err()),
            "Please select both source and destination chains"
        );
        assert_eq!(
            reason(validate_chain_selection(Some(ChainId::Base), Some(ChainId::Base)).unwrap_err()),
            "Source and destination chains must be different"
        );
    }

    #[rstest]
    #[case("  Vitalik.ETH ", "vitalik.eth")]
    #[case("rozo.eth", "rozo.eth")]
    #[case("742d35Cc6634C0532925a3b844Bc9e7595f8fA0d", "0x742d35Cc6634C0532925a3b844Bc9e7595f8fA0d")]
    #[case(" 0xabc ", "0xabc")]
    #[case("GA5Z", "GA5Z")]
    fn test_format_pasted_address(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(format_pasted_address(input), expected);
    }

    #[rstest]
    #[case("0.001234", 6, "0.001234")]
    #[case("12.345678", 6, "12.3457")]
    #[case("12.5", 2, "12.50")]
    #[case("1500", 6, "1.50K")]
    #[case("2500000", 6, "2.50M")]
    #[case("nope", 6, "0")]
    fn test_format_token_amount(#[case] amount: &str, #[case] decimals: usize, #[case] expected: &str) {
        assert_eq!(format_token_amount(amount, decimals), expected);
    }

    #[rstest]
    #[case("0", "$0.00")]
    #[case("1234567.891", "$1,234,567.891")]
    #[case("-5", "-$5.00")]
    #[case("x", "$0.00")]
    fn test_format_usd_amount(#[case] amount: &str, #[case] expected: &str) {
        assert_eq!(format_usd_amount(amount), expected);
    }

    #[rstest]
    #[case(45, "45s")]
    #[case(720, "12m")]
    #[case(3600, "1h")]
    #[case(7500, "2h 5m")]
    #[case(86400, "1d")]
    #[case(273600, "3d 4h")]
    fn test_format_duration(#[case] seconds: u64, #[case] expected: &str) {
        assert_eq!(format_duration(seconds), expected);
    }
}

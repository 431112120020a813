use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{BridgeError, Result};

/// Number of decimal places the Stellar ledger keeps for every asset.
pub const STELLAR_DECIMALS: u32 = 7;

/// One whole unit expressed in stroops.
pub const STROOPS_PER_UNIT: i64 = 10_000_000;

/// An asset amount in stroops (1e-7 units)
///
/// Amounts travel as decimal strings on Horizon and in user input; this type
/// keeps them as integers so fee arithmetic stays exact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Stroops(i64);

impl Stroops {
    pub const ZERO: Stroops = Stroops(0);

    pub const fn new(stroops: i64) -> Self {
        Self(stroops)
    }

    pub const fn as_i64(self) -> i64 {
        self.0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Parses a non-negative decimal string such as `"12.5"` or `"0.0000001"`.
    ///
    /// ```rust
    /// use rozo_bridge::stellar::Stroops;
    ///
    /// assert_eq!(Stroops::parse("1.5").unwrap().as_i64(), 15_000_000);
    /// assert!(Stroops::parse("1.00000001").is_err());
    /// ```
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        let invalid = |reason: &str| BridgeError::InvalidAmount {
            reason: format!("{reason}: {value:?}"),
        };

        if value.is_empty() {
            return Err(invalid("empty amount"));
        }

        let (whole, fraction) = match value.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (value, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("not a number"));
        }
        if !whole.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid("not a number"));
        }
        if fraction.len() > STELLAR_DECIMALS as usize {
            return Err(invalid("too many decimal places"));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("amount too large"))?
        };
        let fraction_digits = fraction.len() as u32;
        let fraction: i64 = if fraction.is_empty() {
            0
        } else {
            fraction.parse().map_err(|_| invalid("not a number"))?
        };
        let fraction = fraction * 10_i64.pow(STELLAR_DECIMALS - fraction_digits);

        whole
            .checked_mul(STROOPS_PER_UNIT)
            .and_then(|w| w.checked_add(fraction))
            .map(Self)
            .ok_or_else(|| invalid("amount too large"))
    }

    /// Converts a floating point quote value, rounding to the nearest stroop.
    pub fn from_f64(value: f64) -> Result<Self> {
        if !value.is_finite() || value < 0.0 {
            return Err(BridgeError::InvalidAmount {
                reason: format!("invalid numeric amount: {value}"),
            });
        }
        let stroops = (value * STROOPS_PER_UNIT as f64).round();
        if stroops > i64::MAX as f64 {
            return Err(BridgeError::InvalidAmount {
                reason: format!("amount too large: {value}"),
            });
        }
        Ok(Self(stroops as i64))
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / STROOPS_PER_UNIT as f64
    }

    pub fn checked_sub(self, other: Stroops) -> Option<Stroops> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Formats with a fixed number of decimals, rounding half away from zero.
    ///
    /// ```rust
    /// use rozo_bridge::stellar::Stroops;
    ///
    /// assert_eq!(Stroops::parse("9.995").unwrap().format_fixed(2), "10.00");
    /// ```
    pub fn format_fixed(self, decimals: u32) -> String {
        let decimals = decimals.min(STELLAR_DECIMALS);
        let scale = 10_u64.pow(STELLAR_DECIMALS - decimals);
        let sign = if self.0 < 0 { "-" } else { "" };
        let rounded = (self.0.unsigned_abs() + scale / 2) / scale;

        if decimals == 0 {
            return format!("{sign}{rounded}");
        }

        let unit = 10_u64.pow(decimals);
        format!(
            "{sign}{}.{:0width$}",
            rounded / unit,
            rounded % unit,
            width = decimals as usize
        )
    }
}

impl fmt::Display for Stroops {
    /// Horizon's canonical seven-decimal form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_fixed(STELLAR_DECIMALS))
    }
}

impl TryFrom<String> for Stroops {
    type Error = BridgeError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Stroops> for String {
    fn from(value: Stroops) -> Self {
        value.to_string()
    }
}

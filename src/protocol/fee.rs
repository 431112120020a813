use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chain::TokenSymbol;
use crate::error::BridgeError;

/// Which side of the transfer the entered amount refers to
///
/// With `ExactIn` the user pays the entered amount and the fee comes out of
/// what arrives. With `ExactOut` the entered amount is what arrives and the
/// fee is added on top. Transfers default to `ExactIn`; fee quotes default
/// to `ExactOut` (see [`FeeQuery::new`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeType {
    #[default]
    #[serde(rename = "exactIn")]
    ExactIn,
    #[serde(rename = "exactOut")]
    ExactOut,
}

impl FeeType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ExactIn => "exactIn",
            Self::ExactOut => "exactOut",
        }
    }
}

impl fmt::Display for FeeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fiat denomination the fee endpoint quotes in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeCurrency {
    #[default]
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "EUR")]
    Eur,
}

impl FeeCurrency {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
        }
    }

    pub const fn for_symbol(symbol: TokenSymbol) -> Self {
        match symbol {
            TokenSymbol::Eurc => Self::Eur,
            TokenSymbol::Usdc | TokenSymbol::Usdt => Self::Usd,
        }
    }
}

/// Parameters of a fee lookup
///
/// Doubles as the cache key, so the amount is kept as its decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeeQuery {
    pub amount: String,
    pub fee_type: FeeType,
    pub app_id: Option<String>,
    pub currency: Option<FeeCurrency>,
}

impl FeeQuery {
    pub fn new(amount: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            fee_type: FeeType::ExactOut,
            app_id: None,
            currency: None,
        }
    }

    pub fn with_fee_type(mut self, fee_type: FeeType) -> Self {
        self.fee_type = fee_type;
        self
    }

    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn with_currency(mut self, currency: FeeCurrency) -> Self {
        self.currency = Some(currency);
        self
    }

    /// Amount as a number; zero, negative and unparsable amounts are rejected.
    pub fn positive_amount(&self) -> Result<f64, BridgeError> {
        match self.amount.trim().parse::<f64>() {
            Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
            _ => Err(BridgeError::InvalidAmount {
                reason: "Amount must be greater than 0".to_string(),
            }),
        }
    }

    /// Query pairs in the order the endpoint documents them.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("amount", self.amount.trim().to_string()),
            ("type", self.fee_type.as_str().to_string()),
        ];
        if let Some(app_id) = &self.app_id {
            pairs.push(("appId", app_id.clone()));
        }
        if let Some(currency) = self.currency {
            pairs.push(("currency", currency.as_str().to_string()));
        }
        pairs
    }
}

/// Successful response of the fee endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuote {
    pub app_id: String,
    pub amount: f64,
    pub currency: String,
    pub fee: f64,
    pub fee_percentage: String,
    pub minimum_fee: String,
    pub amount_in: f64,
    pub amount_out: f64,
}

/// Error body the fee endpoint returns when an amount is out of range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeLimitError {
    pub error: String,
    pub message: String,
    pub received: f64,
    pub max_allowed: f64,
}

/// The two numbers an amount-limit warning displays
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmountLimitWarning {
    pub received: f64,
    pub max_allowed: f64,
}

impl FeeLimitError {
    pub fn warning(&self) -> AmountLimitWarning {
        AmountLimitWarning {
            received: self.received,
            max_allowed: self.max_allowed,
        }
    }
}

impl From<FeeLimitError> for BridgeError {
    fn from(err: FeeLimitError) -> Self {
        BridgeError::AmountLimit {
            error: err.error,
            message: err.message,
            received: err.received,
            max_allowed: err.max_allowed,
        }
    }
}

impl BridgeError {
    /// Warning payload for amount-limit failures.
    pub fn amount_limit_warning(&self) -> Option<AmountLimitWarning> {
        match self {
            BridgeError::AmountLimit {
                received,
                max_allowed,
                ..
            } => Some(AmountLimitWarning {
                received: *received,
                max_allowed: *max_allowed,
            }),
            _ => None,
        }
    }
}

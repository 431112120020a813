//! Payment API request and response types

use bon::Builder;
use serde::{Deserialize, Deserializer, Serialize};

use super::fee::FeeType;
use crate::chain::TokenSymbol;

/// Line item shown by the hosted checkout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentItem {
    pub name: String,
    pub description: String,
}

/// Free-form metadata attached to a payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMetadata {
    /// `"Deposit"` or `"Withdraw"`
    pub intent: String,
    pub items: Vec<PaymentItem>,
}

impl PaymentMetadata {
    pub const ITEM_NAME: &'static str = "ROZO Intents";

    pub fn new(intent: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            intent: intent.into(),
            items: vec![PaymentItem {
                name: Self::ITEM_NAME.to_string(),
                description: description.into(),
            }],
        }
    }
}

/// Body of `POST /payment-api/payments`
#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    #[builder(into)]
    pub app_id: String,
    pub fee_type: FeeType,
    pub to_chain: u64,
    #[builder(into)]
    pub to_token: String,
    #[builder(into)]
    pub to_address: String,
    /// Destination amount as a decimal string
    #[builder(into)]
    pub to_units: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_chain: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub preferred_token_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub receiver_memo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PaymentMetadata>,
}

/// Lifecycle states the payment API reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    PaymentUnpaid,
    PaymentStarted,
    PaymentPayinCompleted,
    PaymentPayoutCompleted,
    PaymentCompleted,
    PaymentBounced,
    PaymentRefunded,
    PaymentExpired,
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    /// Funds have reached the destination.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::PaymentPayoutCompleted | Self::PaymentCompleted)
    }

    /// The payment will not settle.
    pub fn is_failed(&self) -> bool {
        matches!(
            self,
            Self::PaymentBounced | Self::PaymentRefunded | Self::PaymentExpired
        )
    }

    pub fn is_terminal(&self) -> bool {
        self.is_settled() || self.is_failed()
    }
}

/// Where the payer sends funds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSource {
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub amount: Option<String>,
    #[serde(default)]
    pub receiver_address: Option<String>,
    #[serde(default)]
    pub receiver_memo: Option<String>,
    #[serde(default)]
    pub tx_hash: Option<String>,
}

/// Where the payout lands
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDestination {
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub amount: Option<String>,
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub receiver_address: Option<String>,
    #[serde(default)]
    pub tx_hash: Option<String>,
}

/// A payment as returned by create and lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<PaymentStatus>,
    #[serde(default)]
    pub source: PaymentSource,
    #[serde(default)]
    pub destination: Option<PaymentDestination>,
}

impl PaymentResponse {
    pub fn destination_tx_hash(&self) -> Option<&str> {
        self.destination.as_ref()?.tx_hash.as_deref()
    }
}

/// Callback payload of a finished hosted checkout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCompletedEvent {
    #[serde(default)]
    pub rozo_payment_id: Option<String>,
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub tx_hash: Option<String>,
}

/// Hosted-checkout configuration for a deposit into Stellar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentPayConfig {
    pub app_id: String,
    pub fee_type: FeeType,
    pub to_chain: u64,
    pub to_token: String,
    pub to_address: String,
    pub to_units: String,
    pub preferred_symbol: Vec<TokenSymbol>,
    pub metadata: PaymentMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver_memo: Option<String>,
}

impl From<&IntentPayConfig> for CreatePaymentRequest {
    fn from(config: &IntentPayConfig) -> Self {
        CreatePaymentRequest {
            app_id: config.app_id.clone(),
            fee_type: config.fee_type,
            to_chain: config.to_chain,
            to_token: config.to_token.clone(),
            to_address: config.to_address.clone(),
            to_units: config.to_units.clone(),
            preferred_chain: None,
            preferred_token_address: None,
            receiver_memo: config.receiver_memo.clone(),
            metadata: Some(config.metadata.clone()),
        }
    }
}

/// Accepts amounts sent either as JSON numbers or strings.
fn deserialize_optional_amount<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<Amount>::deserialize(deserializer)? {
        None => None,
        Some(Amount::Text(s)) if s.trim().is_empty() => None,
        Some(Amount::Text(s)) => Some(s),
        Some(Amount::Number(n)) => Some(n.to_string()),
    })
}

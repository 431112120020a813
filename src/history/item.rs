use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chain::{ChainId, TokenSymbol};

/// Id segment used for transfers made without a connected wallet.
pub const GUEST_WALLET: &str = "guest";

/// Lifecycle of a recorded transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
    Completed,
    Pending,
    Failed,
    Expired,
}

impl HistoryStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Pending => "pending",
            Self::Failed => "failed",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for HistoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One transfer in the history list
///
/// Chain ids are kept as raw numbers so entries written for chains this
/// build does not know still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeHistoryItem {
    pub id: String,
    pub payment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rozo_payment_id: Option<String>,
    pub amount: String,
    pub source_chain_id: u64,
    pub source_chain_name: String,
    pub source_token_symbol: String,
    pub destination_chain_id: u64,
    pub destination_chain_name: String,
    pub destination_token_symbol: String,
    pub destination_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_tx_hash: Option<String>,
    pub completed_at: DateTime<Utc>,
    pub wallet_address: Option<String>,
    pub status: HistoryStatus,
}

impl BridgeHistoryItem {
    /// `{wallet or guest}_{unix millis}_{payment id}`
    pub fn make_id(wallet_address: Option<&str>, at: DateTime<Utc>, payment_id: &str) -> String {
        format!(
            "{}_{}_{}",
            wallet_address.unwrap_or(GUEST_WALLET),
            at.timestamp_millis(),
            payment_id
        )
    }

    pub fn source_chain(&self) -> Option<ChainId> {
        ChainId::from_u64(self.source_chain_id)
    }

    pub fn destination_chain(&self) -> Option<ChainId> {
        ChainId::from_u64(self.destination_chain_id)
    }

    pub fn belongs_to(&self, wallet_address: Option<&str>) -> bool {
        self.wallet_address.as_deref() == wallet_address
    }
}

/// A transfer to record
///
/// Saving an entry whose `payment_id` is already stored merges into the
/// existing item instead of adding a new one.
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryEntry {
    #[builder(into)]
    pub wallet_address: Option<String>,
    #[builder(into)]
    pub payment_id: String,
    #[builder(into)]
    pub rozo_payment_id: Option<String>,
    #[builder(into)]
    pub amount: String,
    pub source_chain: ChainId,
    pub source_token: TokenSymbol,
    pub destination_chain: ChainId,
    pub destination_token: TokenSymbol,
    #[builder(into)]
    pub destination_address: String,
    #[builder(into)]
    pub source_tx_hash: Option<String>,
    #[builder(into)]
    pub destination_tx_hash: Option<String>,
    #[builder(default = HistoryStatus::Completed)]
    pub status: HistoryStatus,
}

impl NewHistoryEntry {
    pub(crate) fn into_item(self, now: DateTime<Utc>) -> BridgeHistoryItem {
        BridgeHistoryItem {
            id: BridgeHistoryItem::make_id(self.wallet_address.as_deref(), now, &self.payment_id),
            payment_id: self.payment_id,
            rozo_payment_id: self.rozo_payment_id,
            amount: self.amount,
            source_chain_id: self.source_chain.as_u64(),
            source_chain_name: self.source_chain.name().to_string(),
            source_token_symbol: self.source_token.as_str().to_string(),
            destination_chain_id: self.destination_chain.as_u64(),
            destination_chain_name: self.destination_chain.name().to_string(),
            destination_token_symbol: self.destination_token.as_str().to_string(),
            destination_address: self.destination_address,
            source_tx_hash: self.source_tx_hash,
            destination_tx_hash: self.destination_tx_hash,
            completed_at: now,
            wallet_address: self.wallet_address,
            status: self.status,
        }
    }

    /// Folds a repeated save into the stored item.
    ///
    /// Source and destination details are kept. Optional fields are replaced
    /// only when the new save carries them; `completed_at` moves only when
    /// the status transitions into `Completed`.
    pub(crate) fn merge_into(self, existing: &mut BridgeHistoryItem, now: DateTime<Utc>) {
        if let Some(rozo_payment_id) = non_empty(self.rozo_payment_id) {
            existing.rozo_payment_id = Some(rozo_payment_id);
        }
        if !self.amount.trim().is_empty() {
            existing.amount = self.amount;
        }
        if let Some(hash) = non_empty(self.source_tx_hash) {
            existing.source_tx_hash = Some(hash);
        }
        if let Some(hash) = non_empty(self.destination_tx_hash) {
            existing.destination_tx_hash = Some(hash);
        }
        if self.status == HistoryStatus::Completed && existing.status != HistoryStatus::Completed {
            existing.completed_at = now;
        }
        existing.status = self.status;
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry() -> NewHistoryEntry {
        NewHistoryEntry::builder()
            .wallet_address("GWALLET".to_string())
            .payment_id("pay_1")
            .amount("10")
            .source_chain(ChainId::Stellar)
            .source_token(TokenSymbol::Usdc)
            .destination_chain(ChainId::Base)
            .destination_token(TokenSymbol::Usdc)
            .destination_address("0xabc")
            .build()
    }

    #[test]
    fn test_make_id() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(
            BridgeHistoryItem::make_id(None, at, "pay_1"),
            "guest_1700000000123_pay_1"
        );
        assert_eq!(
            BridgeHistoryItem::make_id(Some("GABC"), at, "pay_1"),
            "GABC_1700000000123_pay_1"
        );
    }

    #[test]
    fn test_serializes_camel_case() {
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let item = entry().into_item(at);
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["paymentId"], "pay_1");
        assert_eq!(value["sourceChainName"], "Stellar");
        assert_eq!(value["destinationChainId"], 8453);
        assert_eq!(value["status"], "completed");
        assert_eq!(value["completedAt"], "2023-11-14T22:13:20Z");
        assert!(value.get("sourceTxHash").is_none());
        assert!(value["walletAddress"].is_string());
    }

    #[test]
    fn test_merge_keeps_route_and_ignores_empty_fields() {
        let first = Utc.timestamp_opt(1_000, 0).unwrap();
        let later = Utc.timestamp_opt(2_000, 0).unwrap();
        let mut item = NewHistoryEntry {
            status: HistoryStatus::Pending,
            source_tx_hash: Some("aa".to_string()),
            ..entry()
        }
        .into_item(first);

        NewHistoryEntry {
            amount: String::new(),
            source_tx_hash: None,
            destination_tx_hash: Some("0xdest".to_string()),
            destination_chain: ChainId::Polygon,
            status: HistoryStatus::Pending,
            ..entry()
        }
        .merge_into(&mut item, later);

        assert_eq!(item.amount, "10");
        assert_eq!(item.source_tx_hash.as_deref(), Some("aa"));
        assert_eq!(item.destination_tx_hash.as_deref(), Some("0xdest"));
        assert_eq!(item.destination_chain(), Some(ChainId::Base));
        assert_eq!(item.completed_at, first);
    }

    #[test]
    fn test_merge_refreshes_timestamp_only_on_completion() {
        let first = Utc.timestamp_opt(1_000, 0).unwrap();
        let second = Utc.timestamp_opt(2_000, 0).unwrap();
        let third = Utc.timestamp_opt(3_000, 0).unwrap();
        let mut item = NewHistoryEntry {
            status: HistoryStatus::Pending,
            ..entry()
        }
        .into_item(first);

        entry().merge_into(&mut item, second);
        assert_eq!(item.status, HistoryStatus::Completed);
        assert_eq!(item.completed_at, second);

        entry().merge_into(&mut item, third);
        assert_eq!(item.completed_at, second);
    }
}

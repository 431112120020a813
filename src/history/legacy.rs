//! Per-wallet history format written by earlier releases.
//!
//! The old format is a map of wallet address to a list of transfers. It is
//! only ever read, to import entries into the flat list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use super::item::{BridgeHistoryItem, HistoryStatus};
use crate::chain::{ChainId, TokenSymbol};

/// Storage key of the per-wallet format.
pub const LEGACY_STORAGE_KEY: &str = "rozo_stellar_history";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacyTransferType {
    Deposit,
    Withdraw,
}

/// A transfer in the per-wallet format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyStellarHistoryItem {
    pub id: String,
    pub payment_id: String,
    pub amount: String,
    pub destination_address: String,
    #[serde(rename = "type")]
    pub transfer_type: LegacyTransferType,
    pub from_chain: String,
    pub to_chain: String,
    pub completed_at: DateTime<Utc>,
    pub wallet_address: String,
    #[serde(default = "default_currency")]
    pub currency: TokenSymbol,
}

fn default_currency() -> TokenSymbol {
    TokenSymbol::Usdc
}

/// Wallet address to that wallet's transfers, newest first.
pub type LegacyHistory = BTreeMap<String, Vec<LegacyStellarHistoryItem>>;

/// The per-wallet document with entries left undecoded, so one bad entry
/// does not fail the rest.
pub(crate) type RawLegacyHistory = BTreeMap<String, Vec<serde_json::Value>>;

/// Chain names used by the per-wallet format.
pub fn chain_from_legacy_name(name: &str) -> Option<ChainId> {
    match name {
        "Stellar" => Some(ChainId::Stellar),
        "Base" => Some(ChainId::Base),
        "Ethereum" => Some(ChainId::Ethereum),
        "Polygon" => Some(ChainId::Polygon),
        "Solana" => Some(ChainId::Solana),
        _ => None,
    }
}

impl LegacyStellarHistoryItem {
    /// Converts into the flat format.
    ///
    /// Withdrawals pay out USDC; deposits land in the recorded currency.
    /// Returns `None` for chain names the old format never wrote.
    pub fn into_item(self) -> Option<BridgeHistoryItem> {
        let (Some(source), Some(destination)) = (
            chain_from_legacy_name(&self.from_chain),
            chain_from_legacy_name(&self.to_chain),
        ) else {
            warn!(
                payment_id = %self.payment_id,
                from_chain = %self.from_chain,
                to_chain = %self.to_chain,
                event = "legacy_history_item_skipped"
            );
            return None;
        };

        let destination_token = match self.transfer_type {
            LegacyTransferType::Withdraw => TokenSymbol::Usdc,
            LegacyTransferType::Deposit => self.currency,
        };

        Some(BridgeHistoryItem {
            id: BridgeHistoryItem::make_id(
                Some(&self.wallet_address),
                self.completed_at,
                &self.payment_id,
            ),
            payment_id: self.payment_id,
            rozo_payment_id: None,
            amount: self.amount,
            source_chain_id: source.as_u64(),
            source_chain_name: source.name().to_string(),
            source_token_symbol: self.currency.as_str().to_string(),
            destination_chain_id: destination.as_u64(),
            destination_chain_name: destination.name().to_string(),
            destination_token_symbol: destination_token.as_str().to_string(),
            destination_address: self.destination_address,
            source_tx_hash: None,
            destination_tx_hash: None,
            completed_at: self.completed_at,
            wallet_address: Some(self.wallet_address),
            status: HistoryStatus::Completed,
        })
    }
}

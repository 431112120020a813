//! Horizon response types
//!
//! Only the fields the bridge reads are modelled. Horizon encodes sequence
//! numbers as strings and amounts as seven-decimal strings.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::stellar::{StellarAsset, Stroops, ASSET_TYPE_NATIVE, MEMO_REQUIRED_DATA_KEY};

/// One entry of `account.balances`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub balance: Stroops,
    pub asset_type: String,
    #[serde(default)]
    pub asset_code: Option<String>,
    #[serde(default)]
    pub asset_issuer: Option<String>,
    #[serde(default)]
    pub limit: Option<Stroops>,
}

impl Balance {
    pub fn is_native(&self) -> bool {
        self.asset_type == ASSET_TYPE_NATIVE
    }

    pub fn is_asset(&self, asset: &StellarAsset) -> bool {
        asset.matches(
            &self.asset_type,
            self.asset_code.as_deref(),
            self.asset_issuer.as_deref(),
        )
    }
}

/// `GET /accounts/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountResponse {
    pub account_id: String,
    #[serde(deserialize_with = "deserialize_sequence")]
    pub sequence: i64,
    #[serde(default)]
    pub balances: Vec<Balance>,
    /// Account data entries, values base64-encoded
    #[serde(default)]
    pub data: HashMap<String, String>,
}

impl AccountResponse {
    pub fn native_balance(&self) -> Option<Stroops> {
        self.balances
            .iter()
            .find(|b| b.is_native())
            .map(|b| b.balance)
    }

    pub fn asset_balance(&self, asset: &StellarAsset) -> Option<&Balance> {
        self.balances.iter().find(|b| b.is_asset(asset))
    }

    pub fn memo_required_entry(&self) -> Option<&str> {
        self.data.get(MEMO_REQUIRED_DATA_KEY).map(String::as_str)
    }
}

/// Successful `POST /transactions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub successful: Option<bool>,
    #[serde(default)]
    pub ledger: Option<u64>,
}

/// Problem document Horizon returns on failure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorizonProblem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub extras: Option<ProblemExtras>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemExtras {
    #[serde(default)]
    pub result_codes: Option<ResultCodes>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultCodes {
    #[serde(default)]
    pub transaction: Option<String>,
    #[serde(default)]
    pub operations: Vec<String>,
}

impl HorizonProblem {
    /// `title: tx_code [op_codes]`, or just the title.
    pub fn summary(&self) -> String {
        let codes = self
            .extras
            .as_ref()
            .and_then(|extras| extras.result_codes.as_ref());
        match codes {
            Some(codes) => {
                let tx = codes.transaction.as_deref().unwrap_or("unknown");
                if codes.operations.is_empty() {
                    format!("{}: {tx}", self.title)
                } else {
                    format!("{}: {tx} [{}]", self.title, codes.operations.join(", "))
                }
            }
            None => self.title.clone(),
        }
    }
}

fn deserialize_sequence<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Sequence {
        Text(String),
        Number(i64),
    }

    match Sequence::deserialize(deserializer)? {
        Sequence::Text(s) => s.parse().map_err(serde::de::Error::custom),
        Sequence::Number(n) => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::STELLAR_USDC_ISSUER;
    use serde_json::json;

    fn account_json() -> serde_json::Value {
        json!({
            "id": "GDHU6WRG4IEQXM5NZ4BMPKOXHW76MZM4Y2IEMFDVXBSDP6SJY4ITNPP2",
            "account_id": "GDHU6WRG4IEQXM5NZ4BMPKOXHW76MZM4Y2IEMFDVXBSDP6SJY4ITNPP2",
            "sequence": "123456789012",
            "balances": [
                {
                    "balance": "25.5000000",
                    "limit": "922337203685.4775807",
                    "asset_type": "credit_alphanum4",
                    "asset_code": "USDC",
                    "asset_issuer": STELLAR_USDC_ISSUER
                },
                {"balance": "2.0000000", "asset_type": "native"}
            ],
            "data": {"config.memo_required": "MQ=="}
        })
    }

    #[test]
    fn test_deserialize_account() {
        let account: AccountResponse = serde_json::from_value(account_json()).unwrap();
        assert_eq!(account.sequence, 123_456_789_012);
        assert_eq!(account.native_balance(), Some(Stroops::new(20_000_000)));

        let usdc = account.asset_balance(&StellarAsset::usdc()).unwrap();
        assert_eq!(usdc.balance.format_fixed(2), "25.50");
        assert!(account.asset_balance(&StellarAsset::eurc()).is_none());
        assert_eq!(account.memo_required_entry(), Some("MQ=="));
    }

    #[test]
    fn test_problem_summary() {
        let problem: HorizonProblem = serde_json::from_value(json!({
            "type": "https://stellar.org/horizon-errors/transaction_failed",
            "title": "Transaction Failed",
            "status": 400,
            "extras": {"result_codes": {"transaction": "tx_failed", "operations": ["op_underfunded"]}}
        }))
        .unwrap();
        insta::assert_snapshot!(problem.summary(), @"Transaction Failed: tx_failed [op_underfunded]");
    }

    #[test]
    fn test_problem_without_codes() {
        let problem: HorizonProblem =
            serde_json::from_value(json!({"title": "Resource Missing", "status": 404})).unwrap();
        assert_eq!(problem.summary(), "Resource Missing");
    }
}

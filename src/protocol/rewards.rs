use serde::{Deserialize, Serialize};

/// Loyalty totals the payment API keeps per Stellar address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardsData {
    pub address: String,
    pub seeds: u64,
    pub total_volume_usdc: f64,
    pub total_volume_eurc: f64,
    pub transaction_usdc_count: u64,
    pub transaction_eurc_count: u64,
    pub last_updated_at: String,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_rewards() {
        let json = r#"{
            "address": "GA5ZSEJYB37JRC5AVCIA5MOP4RHTM335X2KGX3IHOJAPP5RE34K4KZVN",
            "seeds": 120,
            "totalVolumeUsdc": 1500.5,
            "totalVolumeEurc": 0,
            "transactionUsdcCount": 7,
            "transactionEurcCount": 0,
            "lastUpdatedAt": "2025-06-01T00:00:00Z",
            "createdAt": "2025-01-01T00:00:00Z"
        }"#;
        let rewards: RewardsData = serde_json::from_str(json).unwrap();
        assert_eq!(rewards.seeds, 120);
        assert_eq!(rewards.transaction_usdc_count, 7);
    }
}

use serde::{Deserialize, Serialize};

/// Settlement-speed bucket for a single transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LatencyColor {
    Green,
    Yellow,
    Red,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: String,
    pub total_payments: u64,
    pub total_volume_usdc: f64,
    pub avg_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeStats {
    pub start_date: String,
    pub end_date: String,
    pub total_payments: u64,
    pub total_volume_usdc: f64,
    pub avg_seconds: f64,
}

/// Aggregate over the most recent transfers, with latency buckets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentStats {
    pub start_time: String,
    pub end_time: String,
    pub total_payments: u64,
    pub total_volume_usdc: f64,
    pub green_count: u64,
    pub yellow_count: u64,
    pub red_count: u64,
    pub avg_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxLatency {
    pub timestamp: String,
    /// Seconds from pay-in to payout
    pub duration: f64,
    pub color: LatencyColor,
}

/// Response of the public analytics endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsData {
    pub today: DailyStats,
    pub last_7_days: RangeStats,
    pub last_50_txs: RecentStats,
    #[serde(default)]
    pub txs: Vec<TxLatency>,
}

impl RecentStats {
    /// Share of recent transfers that settled in the green bucket.
    pub fn green_ratio(&self) -> Option<f64> {
        let total = self.green_count + self.yellow_count + self.red_count;
        (total > 0).then(|| self.green_count as f64 / total as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "today": {"date": "2025-06-01", "total_payments": 12, "total_volume_usdc": 1530.25, "avg_seconds": 14.2},
        "last_7_days": {"start_date": "2025-05-26", "end_date": "2025-06-01", "total_payments": 80, "total_volume_usdc": 9000, "avg_seconds": 16},
        "last_50_txs": {
            "start_time": "2025-05-30T10:00:00Z", "end_time": "2025-06-01T09:00:00Z",
            "total_payments": 50, "total_volume_usdc": 4200.5,
            "green_count": 40, "yellow_count": 8, "red_count": 2, "avg_seconds": 12.5
        },
        "txs": [
            {"timestamp": "2025-06-01T09:00:00Z", "duration": 9, "color": "green"},
            {"timestamp": "2025-06-01T08:00:00Z", "duration": 95, "color": "red"}
        ]
    }"#;

    #[test]
    fn test_deserialize_analytics() {
        let data: AnalyticsData = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(data.today.total_payments, 12);
        assert_eq!(data.last_7_days.total_volume_usdc, 9000.0);
        assert_eq!(data.txs.len(), 2);
        assert_eq!(data.txs[1].color, LatencyColor::Red);
        assert_eq!(data.last_50_txs.green_ratio(), Some(0.8));
    }

    #[test]
    fn test_green_ratio_empty() {
        let data: AnalyticsData = serde_json::from_str(SAMPLE).unwrap();
        let empty = RecentStats {
            green_count: 0,
            yellow_count: 0,
            red_count: 0,
            ..data.last_50_txs
        };
        assert_eq!(empty.green_ratio(), None);
    }
}

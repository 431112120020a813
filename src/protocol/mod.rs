//! Wire types of the hosted ROZO APIs and of Horizon
//!
//! This module contains the request and response shapes exchanged with the
//! fee, analytics, rewards and payment endpoints, plus the subset of Horizon
//! account and submission responses the bridge reads.

mod analytics;
mod fee;
mod horizon;
mod payment;
mod rewards;

pub use analytics::{AnalyticsData, DailyStats, LatencyColor, RangeStats, RecentStats, TxLatency};
pub use fee::{AmountLimitWarning, FeeCurrency, FeeLimitError, FeeQuery, FeeQuote, FeeType};
pub use horizon::{
    AccountResponse, Balance, HorizonProblem, ProblemExtras, ResultCodes, SubmitResponse,
};
pub use payment::{
    CreatePaymentRequest, IntentPayConfig, PaymentCompletedEvent, PaymentDestination, PaymentItem,
    PaymentMetadata, PaymentResponse, PaymentSource, PaymentStatus,
};
pub use rewards::RewardsData;

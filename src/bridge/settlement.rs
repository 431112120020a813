use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn, Instrument};

use super::config::PollingConfig;
use crate::error::{BridgeError, Result};
use crate::history::{HistoryStatus, HistoryStore};
use crate::protocol::{PaymentResponse, PaymentStatus};
use crate::spans;
use crate::traits::{Clock, PaymentProvider};

/// Follows a payment until it pays out on the destination chain
///
/// Each poll asks the payment API for the payment. Settled payments mark
/// the history item `completed` with the destination transaction hash;
/// bounced, refunded or expired payments mark it `failed`.
///
/// # Example
///
/// ```rust,no_run
/// use rozo_bridge::bridge::SettlementTracker;
/// use rozo_bridge::history::HistoryStore;
/// use rozo_bridge::providers::{RozoApiClient, TokioClock};
/// use rozo_bridge::PollingConfig;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), rozo_bridge::BridgeError> {
/// let clock = Arc::new(TokioClock);
/// let tracker = SettlementTracker::new(
///     Arc::new(RozoApiClient::production()?),
///     Arc::new(HistoryStore::in_memory(clock.clone())),
///     clock,
/// )
/// .with_polling_config(PollingConfig::slow_payout());
///
/// let payment = tracker.wait_for_settlement("pay_123").await?;
/// println!("paid out in {:?}", payment.destination_tx_hash());
/// # Ok(())
/// # }
/// ```
pub struct SettlementTracker {
    payments: Arc<dyn PaymentProvider>,
    history: Arc<HistoryStore>,
    clock: Arc<dyn Clock>,
    config: PollingConfig,
}

impl SettlementTracker {
    pub fn new(
        payments: Arc<dyn PaymentProvider>,
        history: Arc<HistoryStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            payments,
            history,
            clock,
            config: PollingConfig::default(),
        }
    }

    pub fn with_polling_config(mut self, config: PollingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn polling_config(&self) -> PollingConfig {
        self.config
    }

    /// Polls until the payment settles, fails or the attempts run out.
    ///
    /// Gateway timeouts count as a pending attempt. Any other lookup error
    /// ends the wait.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::SettlementFailed`] when the payment bounces, is
    ///   refunded or expires
    /// - [`BridgeError::SettlementTimeout`] after `max_attempts` polls
    pub async fn wait_for_settlement(&self, payment_id: &str) -> Result<PaymentResponse> {
        let PollingConfig {
            max_attempts,
            poll_interval_secs,
        } = self.config;
        let span = spans::wait_for_settlement(payment_id, max_attempts, poll_interval_secs);

        async {
            info!(payment_id, event = "settlement_polling_started");

            for attempt in 1..=max_attempts {
                let lookup = self
                    .payments
                    .get_payment(payment_id)
                    .instrument(spans::get_payment(payment_id, attempt))
                    .await;

                let payment = match lookup {
                    Ok(payment) => payment,
                    Err(BridgeError::GatewayTimeout) => {
                        debug!(attempt, event = "settlement_lookup_timed_out");
                        self.clock.sleep(Duration::from_secs(poll_interval_secs)).await;
                        continue;
                    }
                    Err(e) => {
                        spans::record_error_with_context(
                            "PaymentLookupFailed",
                            &e.to_string(),
                            Some(&format!("Attempt {attempt}/{max_attempts}")),
                        );
                        error!(error = %e, attempt, event = "settlement_lookup_failed");
                        return Err(e);
                    }
                };

                match payment.status {
                    Some(status) if status.is_settled() => {
                        let hash = payment.destination_tx_hash();
                        self.record_status(payment_id, HistoryStatus::Completed, hash);
                        info!(
                            attempt,
                            destination_tx_hash = hash.unwrap_or_default(),
                            event = "payment_settled"
                        );
                        return Ok(payment);
                    }
                    Some(status) if status.is_failed() => {
                        self.record_status(payment_id, HistoryStatus::Failed, None);
                        let err = BridgeError::SettlementFailed {
                            payment_id: payment_id.to_string(),
                        };
                        spans::record_error_with_context(
                            "SettlementFailed",
                            &err.to_string(),
                            Some(status_label(status)),
                        );
                        error!(status = status_label(status), event = "payment_not_settled");
                        return Err(err);
                    }
                    status => {
                        debug!(
                            attempt,
                            status = status.map(status_label).unwrap_or("none"),
                            event = "settlement_pending"
                        );
                    }
                }

                self.clock.sleep(Duration::from_secs(poll_interval_secs)).await;
            }

            let err = BridgeError::SettlementTimeout {
                payment_id: payment_id.to_string(),
            };
            spans::record_error_with_context(
                "SettlementTimeout",
                &err.to_string(),
                Some(&format!("{max_attempts} attempts")),
            );
            error!(event = "settlement_polling_timeout");
            Err(err)
        }
        .instrument(span)
        .await
    }

    fn record_status(&self, payment_id: &str, status: HistoryStatus, hash: Option<&str>) {
        match self.history.update_status(payment_id, status, hash) {
            Ok(Some(_)) => {}
            Ok(None) => debug!(payment_id, event = "settlement_without_history"),
            Err(e) => warn!(error = %e, payment_id, event = "history_status_update_failed"),
        }
    }
}

fn status_label(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::PaymentUnpaid => "payment_unpaid",
        PaymentStatus::PaymentStarted => "payment_started",
        PaymentStatus::PaymentPayinCompleted => "payment_payin_completed",
        PaymentStatus::PaymentPayoutCompleted => "payment_payout_completed",
        PaymentStatus::PaymentCompleted => "payment_completed",
        PaymentStatus::PaymentBounced => "payment_bounced",
        PaymentStatus::PaymentRefunded => "payment_refunded",
        PaymentStatus::PaymentExpired => "payment_expired",
        PaymentStatus::Unknown => "unknown",
    }
}

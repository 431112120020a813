//! OpenTelemetry span helpers for bridge operations
//!
//! Static span names, structured attributes, and separation from business
//! logic. The flows in [`crate::bridge`] and [`crate::wallet`] use these
//! internally; they are public for callers who want to wrap their own
//! instrumentation around the same names.
//!
//! # Example
//!
//! ```rust,no_run
//! use rozo_bridge::spans;
//!
//! let span = spans::wait_for_settlement("pay_123", 60, 5);
//! let _guard = span.enter();
//! // custom polling logic here
//! ```

use tracing::Span;
use url::Url;

use crate::chain::ChainId;
use crate::stellar::StellarNetwork;

/// Create span for a complete Stellar withdrawal.
///
/// Parent: caller
/// Children: create_payment, sign_transaction, submit_transaction
#[inline]
pub fn withdraw(source: &str, destination_chain: ChainId, amount: &str) -> Span {
    tracing::info_span!(
        "rozo_bridge.withdraw",
        source = source,
        destination_chain = %destination_chain,
        amount = amount,
        payment_id = tracing::field::Empty,
        tx_hash = tracing::field::Empty,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.source = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for payment creation against the payment API.
///
/// Parent: withdraw or deposit submission
/// Children: http_request
#[inline]
pub fn create_payment(app_id: &str, to_chain: u64, to_units: &str) -> Span {
    tracing::info_span!(
        "rozo_bridge.create_payment",
        app_id = app_id,
        to_chain = to_chain,
        to_units = to_units,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for handing an envelope to the signer.
///
/// Parent: withdraw or create_trustline
/// Children: None (signers are opaque)
#[inline]
pub fn sign_transaction(account: &str, network: StellarNetwork, sequence: i64) -> Span {
    tracing::debug_span!(
        "rozo_bridge.sign_transaction",
        account = account,
        network = %network,
        sequence = sequence,
    )
}

/// Create span for Horizon submission.
///
/// Parent: withdraw or create_trustline
/// Children: http_request
#[inline]
pub fn submit_transaction(network: StellarNetwork) -> Span {
    tracing::info_span!(
        "rozo_bridge.submit_transaction",
        network = %network,
        tx_hash = tracing::field::Empty,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for settlement polling.
///
/// Parent: caller
/// Children: get_payment (one per attempt)
#[inline]
pub fn wait_for_settlement(payment_id: &str, max_attempts: u32, poll_interval_secs: u64) -> Span {
    tracing::info_span!(
        "rozo_bridge.wait_for_settlement",
        payment_id = payment_id,
        max_attempts = max_attempts,
        poll_interval_secs = poll_interval_secs,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.context = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for a single payment status lookup.
///
/// Parent: wait_for_settlement
#[inline]
pub fn get_payment(payment_id: &str, attempt: u32) -> Span {
    tracing::debug_span!(
        "rozo_bridge.get_payment",
        payment_id = payment_id,
        attempt = attempt,
    )
}

/// Create span for opening a trustline.
#[inline]
pub fn create_trustline(account: &str, asset: &str) -> Span {
    tracing::info_span!(
        "rozo_bridge.create_trustline",
        account = account,
        asset = asset,
        tx_hash = tracing::field::Empty,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for a balance refresh (one account lookup).
#[inline]
pub fn refresh_balances(account: &str) -> Span {
    tracing::debug_span!("rozo_bridge.refresh_balances", account = account)
}

/// Create span for a wallet connection attempt.
#[inline]
pub fn wallet_connect(wallet_id: &str) -> Span {
    tracing::info_span!(
        "rozo_bridge.wallet_connect",
        wallet_id = wallet_id,
        address = tracing::field::Empty,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for a fee quote lookup.
#[inline]
pub fn get_fee(amount: &str, fee_type: &str, cached: bool) -> Span {
    tracing::debug_span!(
        "rozo_bridge.get_fee",
        amount = amount,
        fee_type = fee_type,
        cached = cached,
    )
}

/// Create span for an HTTP request to a hosted API or Horizon.
///
/// Parent: any API operation
/// Children: None (HTTP client handles internal spans)
#[inline]
pub fn http_request(method: &str, url: &Url) -> Span {
    tracing::trace_span!(
        "rozo_bridge.http_request",
        http.method = method,
        http.url = %url,
    )
}

/// Record error attributes on the current span.
///
/// Follows OpenTelemetry semantic conventions for error tracking:
/// - error.type: The error type/variant
/// - error.message: Human-readable error message
/// - error.source: The underlying cause, when there is one
pub fn record_error<E: std::error::Error>(error: &E) {
    let current_span = tracing::Span::current();
    let message = error.to_string();
    current_span.record("error.type", message.split(':').next().unwrap_or("Unknown"));
    current_span.record("error.message", message.as_str());
    current_span.record("otel.status_code", "ERROR");

    if let Some(source) = error.source() {
        current_span.record("error.source", source.to_string());
    }
}

/// Record error attributes with custom context on the current span.
pub fn record_error_with_context(
    error_type: &str,
    error_message: &str,
    additional_context: Option<&str>,
) {
    let current_span = tracing::Span::current();
    current_span.record("error.type", error_type);
    current_span.record("error.message", error_message);
    current_span.record("otel.status_code", "ERROR");

    if let Some(context) = additional_context {
        current_span.record("error.context", context);
    }
}

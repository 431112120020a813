//! Core trait abstractions for bridge operations.
//!
//! This module defines the seams between the bridge logic and the outside
//! world: the Stellar ledger, the hosted ROZO APIs, the user's wallet and
//! time. Production implementations live in [`crate::providers`]; fakes for
//! tests live in [`crate::testing`].
//!
//! # Example: Implementing a Test Fake
//!
//! ```rust,ignore
//! use rozo_bridge::{AnalyticsProvider, AnalyticsData, Result};
//!
//! struct FixedAnalytics(AnalyticsData);
//!
//! #[async_trait::async_trait]
//! impl AnalyticsProvider for FixedAnalytics {
//!     async fn get_analytics(&self) -> Result<AnalyticsData> {
//!         Ok(self.0.clone())
//!     }
//! }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::error::Result;
use crate::protocol::{
    AccountResponse, AnalyticsData, CreatePaymentRequest, FeeQuery, FeeQuote, PaymentResponse,
    RewardsData, SubmitResponse,
};
use crate::stellar::{StellarAddress, StellarNetwork};
use crate::wallet::ConnectorView;

/// Trait for Stellar ledger reads and transaction submission.
///
/// # Test Scenarios
///
/// Implementing this trait with fakes enables testing:
/// - Accounts that do not exist yet (unfunded)
/// - Missing trustlines and low XLM balances
/// - Submission failures and responses without a hash
#[async_trait]
pub trait LedgerProvider: Send + Sync {
    /// Loads an account with its balances, sequence number and data entries.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BridgeError::AccountNotFound`] if the account is not
    /// on the ledger, or a network/API error otherwise.
    async fn load_account(&self, account: &StellarAddress) -> Result<AccountResponse>;

    /// Submits a signed base64 transaction envelope.
    async fn submit_transaction(&self, envelope_xdr: &str) -> Result<SubmitResponse>;

    /// The network this provider talks to.
    fn network(&self) -> StellarNetwork;
}

/// Trait for the hosted fee quote endpoint.
///
/// # Test Scenarios
///
/// - Amount-limit responses (`received` / `maxAllowed`)
/// - Gateway timeouts
#[async_trait]
pub trait FeeProvider: Send + Sync {
    /// Quotes the fee for an amount.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BridgeError::InvalidAmount`] for non-positive amounts
    /// without contacting the endpoint.
    async fn get_fee(&self, query: &FeeQuery) -> Result<FeeQuote>;
}

/// Trait for the public transfer statistics endpoint.
#[async_trait]
pub trait AnalyticsProvider: Send + Sync {
    async fn get_analytics(&self) -> Result<AnalyticsData>;
}

/// Trait for per-address reward totals.
#[async_trait]
pub trait RewardsProvider: Send + Sync {
    async fn get_rewards(&self, address: &str) -> Result<RewardsData>;
}

/// Trait for creating and looking up intent payments.
///
/// # Test Scenarios
///
/// - Responses without an id or receiver address
/// - Payments that bounce or never settle
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_payment(&self, request: &CreatePaymentRequest) -> Result<PaymentResponse>;

    async fn get_payment(&self, payment_id: &str) -> Result<PaymentResponse>;
}

/// Trait for anything that can sign a Stellar transaction.
///
/// Browser wallets take and return base64 XDR, so this seam does too.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Returns the signed envelope as base64 XDR.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BridgeError::WalletRejected`] when the user declines.
    async fn sign_transaction(&self, envelope_xdr: &str, network: StellarNetwork)
        -> Result<String>;
}

/// Adapter boundary to an external wallet SDK.
///
/// The [`crate::wallet::WalletSession`] owns connection state; a connector
/// only performs the SDK calls and receives view updates.
#[async_trait]
pub trait WalletConnector: Send + Sync {
    /// Asks the wallet for access and returns the account address.
    ///
    /// This is the one call that prompts the user.
    async fn connect(&self, wallet_id: &str) -> Result<String>;

    async fn disconnect(&self) -> Result<()>;

    /// Pushes the session's current view to the SDK.
    async fn push_view(&self, view: &ConnectorView) -> Result<()>;
}

/// Trait for time-based operations.
///
/// This trait abstracts sleep and wall-clock queries, enabling fast-forward
/// testing of settlement polling and history expiry without waiting.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Asynchronously sleeps for the given duration.
    async fn sleep(&self, duration: Duration);

    /// Returns the current wall-clock time.
    fn now(&self) -> DateTime<Utc>;
}

//! # rozo-bridge
//!
//! A Rust SDK for moving USDC and EURC between Stellar and EVM chains or
//! Solana through ROZO intent payments.
//!
//! A withdrawal creates an intent payment, signs a Stellar payment to the
//! deposit address the payment API hands out, and submits it to Horizon.
//! A deposit prepares a hosted-checkout payment that pays out to a Stellar
//! account holding the right trustline. Completed transfers are kept in a
//! local history.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rozo_bridge::bridge::{SettlementTracker, WithdrawFlow, WithdrawRequest};
//! use rozo_bridge::config::BridgeConfig;
//! use rozo_bridge::providers::{KeypairSigner, TokioClock, KEYPAIR_WALLET_ID};
//! use rozo_bridge::wallet::WalletSession;
//! use rozo_bridge::{BridgeError, ChainId};
//! use std::sync::Arc;
//!
//! # async fn example(secret: &str) -> Result<(), BridgeError> {
//! let config = BridgeConfig::from_env()?;
//! let clock = Arc::new(TokioClock::new());
//! let payments = Arc::new(config.rozo_client()?);
//! let history = Arc::new(config.history_store(clock.clone())?);
//!
//! let signer = Arc::new(KeypairSigner::from_secret(secret)?);
//! let wallet = Arc::new(WalletSession::new(signer.clone()));
//! wallet.connect(KEYPAIR_WALLET_ID).await?;
//!
//! let flow = WithdrawFlow::builder()
//!     .payments(payments.clone())
//!     .ledger(Arc::new(config.horizon_client()?))
//!     .signer(signer)
//!     .wallet(wallet)
//!     .history(history.clone())
//!     .clock(clock.clone())
//!     .app_id(config.app_id.as_str())
//!     .build();
//!
//! let receipt = flow
//!     .execute(
//!         &WithdrawRequest::builder()
//!             .amount("25")
//!             .fee("0.25")
//!             .destination_address("0x742d35Cc6634c0532925A3b844Bc9e7595f8fa0d")
//!             .destination_chain(ChainId::Base)
//!             .build(),
//!     )
//!     .await?;
//!
//! // Optionally wait for the payout on Base.
//! let payment = SettlementTracker::new(payments, history, clock)
//!     .wait_for_settlement(&receipt.payment_id)
//!     .await?;
//! println!("settled: {:?}", payment.destination_tx_hash());
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Stellar transactions** built and hashed with `stellar-xdr`, signed by
//!   any [`TransactionSigner`]
//! - **Trustline and reserve checks** before a transfer is offered
//! - **Cached fee quotes** with amount-limit warnings
//! - **Local transfer history** with legacy-format migration
//! - **Test fakes** for every external seam in [`testing`]
//!
//! ## Public API
//!
//! - [`bridge`] - withdrawal flow, deposit planner, settlement tracking
//! - [`wallet`] - wallet session, balances and trustlines
//! - [`history`] - transfer history store
//! - [`providers`] - Horizon, ROZO API, keypair signer and clock
//! - [`BridgeError`] and [`Result`] - error types for error handling

pub mod bridge;
pub mod cache;
pub mod chain;
pub mod config;
mod error;
pub mod history;
pub mod protocol;
pub mod providers;
pub mod stellar;
pub mod traits;
pub mod validation;
pub mod wallet;

// Public module for advanced users who need custom instrumentation
pub mod spans;

pub mod testing;

pub use bridge::PollingConfig;
pub use chain::{ChainId, Token, TokenSymbol};
pub use error::{BridgeError, Result};
pub use protocol::{
    AnalyticsData, CreatePaymentRequest, FeeQuery, FeeQuote, FeeType, PaymentResponse,
    PaymentStatus, RewardsData,
};
pub use traits::{
    AnalyticsProvider, Clock, FeeProvider, LedgerProvider, PaymentProvider, RewardsProvider,
    TransactionSigner, WalletConnector,
};

//! Test utilities and fake implementations of the bridge seams
//!
//! This module provides fake implementations of the traits in
//! [`crate::traits`] so the withdrawal, deposit, wallet and history logic
//! can be exercised without Horizon, the hosted ROZO APIs or a browser
//! wallet. Every fake shares its state behind `Arc<Mutex<..>>`, so a test
//! keeps a handle for assertions after handing a clone to the code under
//! test.
//!
//! Async methods yield to the runtime once before answering, the way a real
//! network call would. Observers of `watch` channels get to run between
//! steps as a result.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{BridgeError, Result};
use crate::protocol::{
    AccountResponse, AnalyticsData, Balance, CreatePaymentRequest, DailyStats, FeeLimitError,
    FeeQuery, FeeQuote, PaymentResponse, PaymentSource, PaymentStatus, RangeStats, RecentStats,
    RewardsData, SubmitResponse,
};
use crate::providers::KeypairSigner;
use crate::stellar::{
    decode_envelope, encode_envelope, envelope_hash, StellarAddress, StellarAsset, StellarNetwork,
    Stroops, ASSET_TYPE_NATIVE, MAX_TRUST_LIMIT,
};
use crate::traits::{
    AnalyticsProvider, Clock, FeeProvider, LedgerProvider, PaymentProvider, RewardsProvider,
    TransactionSigner, WalletConnector,
};
use crate::wallet::ConnectorView;

/// Deposit address the fake payment API hands out for Stellar pay-ins.
pub const FAKE_RECEIVER_ADDRESS: &str = "GDHU6WRG4IEQXM5NZ4BMPKOXHW76MZM4Y2IEMFDVXBSDP6SJY4ITNPP2";

/// Memo the fake payment API asks Stellar payers to attach.
pub const FAKE_RECEIVER_MEMO: &str = "827364";

/// Sequence number of accounts built by [`test_account`].
pub const TEST_ACCOUNT_SEQUENCE: i64 = 103_720_918_407_102_567;

// ============================================================================
// Fake ROZO API
// ============================================================================

#[derive(Default)]
struct RozoState {
    fee_calls: usize,
    fee_limit: Option<(f64, f64)>,
    analytics_calls: usize,
    rewards_calls: usize,
    create_requests: Vec<CreatePaymentRequest>,
    create_response: Option<PaymentResponse>,
    create_failure: Option<BridgeError>,
    payment_sequences: HashMap<String, VecDeque<Result<PaymentResponse>>>,
    get_payment_calls: usize,
}

/// A fake of the hosted fee, analytics, rewards and payment endpoints.
///
/// This allows testing scenarios like:
/// - Fee quotes that hit the amount limit
/// - Cache hits and invalidation (via call counts)
/// - Payment responses without an id or deposit address
/// - Payments that stay pending, bounce or time out at the gateway
#[derive(Clone, Default)]
pub struct FakeRozoApi {
    state: Arc<Mutex<RozoState>>,
}

impl FakeRozoApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every fee lookup fail with an amount-limit error.
    pub fn fail_fee_with_limit(&self, received: f64, max_allowed: f64) {
        self.state.lock().unwrap().fee_limit = Some((received, max_allowed));
    }

    pub fn fee_call_count(&self) -> usize {
        self.state.lock().unwrap().fee_calls
    }

    pub fn analytics_call_count(&self) -> usize {
        self.state.lock().unwrap().analytics_calls
    }

    pub fn rewards_call_count(&self) -> usize {
        self.state.lock().unwrap().rewards_calls
    }

    /// Replaces the response `create_payment` returns.
    ///
    /// By default a payment `pay_test` is created with the fake deposit
    /// address and memo.
    pub fn set_create_payment_response(&self, response: PaymentResponse) {
        self.state.lock().unwrap().create_response = Some(response);
    }

    /// Makes the next `create_payment` call fail.
    pub fn fail_create_payment_with(&self, error: BridgeError) {
        self.state.lock().unwrap().create_failure = Some(error);
    }

    pub fn create_payment_call_count(&self) -> usize {
        self.state.lock().unwrap().create_requests.len()
    }

    pub fn last_create_request(&self) -> Option<CreatePaymentRequest> {
        self.state.lock().unwrap().create_requests.last().cloned()
    }

    /// Scripts the answers for a payment id.
    ///
    /// Answers are handed out in order. A final `Ok` repeats forever; a
    /// final error is returned once, after which lookups answer 404.
    pub fn set_payment_sequence(&self, payment_id: &str, answers: Vec<Result<PaymentResponse>>) {
        self.state
            .lock()
            .unwrap()
            .payment_sequences
            .insert(payment_id.to_string(), answers.into());
    }

    pub fn get_payment_call_count(&self) -> usize {
        self.state.lock().unwrap().get_payment_calls
    }
}

/// A payment in the given state, as the lookup endpoint reports it.
pub fn payment_with_status(payment_id: &str, status: PaymentStatus) -> PaymentResponse {
    PaymentResponse {
        id: Some(payment_id.to_string()),
        status: Some(status),
        source: PaymentSource::default(),
        destination: None,
    }
}

fn default_created_payment(request: &CreatePaymentRequest) -> PaymentResponse {
    PaymentResponse {
        id: Some("pay_test".to_string()),
        status: Some(PaymentStatus::PaymentUnpaid),
        source: PaymentSource {
            amount: Some(request.to_units.clone()),
            receiver_address: Some(FAKE_RECEIVER_ADDRESS.to_string()),
            receiver_memo: Some(FAKE_RECEIVER_MEMO.to_string()),
            tx_hash: None,
        },
        destination: None,
    }
}

#[async_trait]
impl FeeProvider for FakeRozoApi {
    async fn get_fee(&self, query: &FeeQuery) -> Result<FeeQuote> {
        tokio::task::yield_now().await;
        let amount = query.positive_amount()?;

        let mut state = self.state.lock().unwrap();
        state.fee_calls += 1;
        if let Some((received, max_allowed)) = state.fee_limit {
            return Err(FeeLimitError {
                error: "AMOUNT_LIMIT_EXCEEDED".to_string(),
                message: format!("Amount exceeds the maximum of {max_allowed}"),
                received,
                max_allowed,
            }
            .into());
        }

        let fee = (amount * 0.001).max(0.1);
        Ok(FeeQuote {
            app_id: query.app_id.clone().unwrap_or_default(),
            amount,
            currency: "USDC".to_string(),
            fee,
            fee_percentage: "0.1%".to_string(),
            minimum_fee: "0.1".to_string(),
            amount_in: amount + fee,
            amount_out: amount,
        })
    }
}

#[async_trait]
impl AnalyticsProvider for FakeRozoApi {
    async fn get_analytics(&self) -> Result<AnalyticsData> {
        tokio::task::yield_now().await;
        self.state.lock().unwrap().analytics_calls += 1;
        Ok(AnalyticsData {
            today: DailyStats {
                date: "2025-01-01".to_string(),
                total_payments: 12,
                total_volume_usdc: 4_250.5,
                avg_seconds: 9.4,
            },
            last_7_days: RangeStats {
                start_date: "2024-12-26".to_string(),
                end_date: "2025-01-01".to_string(),
                total_payments: 80,
                total_volume_usdc: 31_020.0,
                avg_seconds: 11.2,
            },
            last_50_txs: RecentStats {
                start_time: "2024-12-30T08:00:00Z".to_string(),
                end_time: "2025-01-01T00:00:00Z".to_string(),
                total_payments: 50,
                total_volume_usdc: 18_400.0,
                green_count: 44,
                yellow_count: 5,
                red_count: 1,
                avg_seconds: 10.1,
            },
            txs: Vec::new(),
        })
    }
}

#[async_trait]
impl RewardsProvider for FakeRozoApi {
    async fn get_rewards(&self, address: &str) -> Result<RewardsData> {
        tokio::task::yield_now().await;
        self.state.lock().unwrap().rewards_calls += 1;
        Ok(RewardsData {
            address: address.to_string(),
            seeds: 120,
            total_volume_usdc: 1_200.0,
            total_volume_eurc: 0.0,
            transaction_usdc_count: 3,
            transaction_eurc_count: 0,
            last_updated_at: "2025-01-01T00:00:00Z".to_string(),
            created_at: "2024-12-01T00:00:00Z".to_string(),
        })
    }
}

#[async_trait]
impl PaymentProvider for FakeRozoApi {
    async fn create_payment(&self, request: &CreatePaymentRequest) -> Result<PaymentResponse> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().unwrap();
        state.create_requests.push(request.clone());
        if let Some(err) = state.create_failure.take() {
            return Err(err);
        }
        Ok(state
            .create_response
            .clone()
            .unwrap_or_else(|| default_created_payment(request)))
    }

    async fn get_payment(&self, payment_id: &str) -> Result<PaymentResponse> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().unwrap();
        state.get_payment_calls += 1;

        let not_found = || BridgeError::Api {
            status: 404,
            message: format!("payment {payment_id} not found"),
        };
        let Some(answers) = state.payment_sequences.get_mut(payment_id) else {
            return Err(not_found());
        };
        match answers.len() {
            0 => Err(not_found()),
            1 => match answers.front() {
                Some(Ok(payment)) => Ok(payment.clone()),
                _ => answers.pop_front().unwrap_or_else(|| Err(not_found())),
            },
            _ => answers.pop_front().unwrap_or_else(|| Err(not_found())),
        }
    }
}

// ============================================================================
// Fake Ledger
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum SubmitMode {
    Accept,
    WithoutHash,
    Reject(String),
}

struct LedgerState {
    accounts: HashMap<String, AccountResponse>,
    load_count: usize,
    submitted: Vec<String>,
    submit_mode: SubmitMode,
}

/// A fake Horizon server holding a fixed set of accounts.
///
/// This allows testing scenarios like:
/// - Unfunded accounts (never added, or removed mid-test)
/// - Missing trustlines and low XLM reserves
/// - Submission failures and responses without a hash
///
/// Submitted envelopes are decoded, so a malformed envelope fails the same
/// way it would on the network, and the returned hash is the real
/// transaction hash.
#[derive(Clone)]
pub struct FakeLedger {
    state: Arc<Mutex<LedgerState>>,
    network: StellarNetwork,
}

impl Default for FakeLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeLedger {
    pub fn new() -> Self {
        Self::with_network(StellarNetwork::Public)
    }

    pub fn with_network(network: StellarNetwork) -> Self {
        Self {
            state: Arc::new(Mutex::new(LedgerState {
                accounts: HashMap::new(),
                load_count: 0,
                submitted: Vec::new(),
                submit_mode: SubmitMode::Accept,
            })),
            network,
        }
    }

    /// Adds or replaces an account, keyed by its `account_id`.
    pub fn set_account(&self, account: AccountResponse) {
        self.state
            .lock()
            .unwrap()
            .accounts
            .insert(account.account_id.clone(), account);
    }

    pub fn remove_account(&self, account_id: &str) {
        self.state.lock().unwrap().accounts.remove(account_id);
    }

    /// Makes every submission fail with the given result code.
    pub fn reject_submissions(&self, reason: &str) {
        self.state.lock().unwrap().submit_mode = SubmitMode::Reject(reason.to_string());
    }

    /// Accepts submissions but leaves the hash out of the response.
    pub fn omit_submission_hash(&self) {
        self.state.lock().unwrap().submit_mode = SubmitMode::WithoutHash;
    }

    pub fn load_count(&self) -> usize {
        self.state.lock().unwrap().load_count
    }

    pub fn submit_count(&self) -> usize {
        self.state.lock().unwrap().submitted.len()
    }

    /// Envelopes that were accepted or attempted, in order.
    pub fn submitted_envelopes(&self) -> Vec<String> {
        self.state.lock().unwrap().submitted.clone()
    }
}

#[async_trait]
impl LedgerProvider for FakeLedger {
    async fn load_account(&self, account: &StellarAddress) -> Result<AccountResponse> {
        tokio::task::yield_now().await;
        let account_id = account.base_account().to_string();
        let mut state = self.state.lock().unwrap();
        state.load_count += 1;
        state
            .accounts
            .get(&account_id)
            .cloned()
            .ok_or(BridgeError::AccountNotFound {
                account: account_id,
            })
    }

    async fn submit_transaction(&self, envelope_xdr: &str) -> Result<SubmitResponse> {
        tokio::task::yield_now().await;
        let envelope = decode_envelope(envelope_xdr)?;
        let hash = envelope_hash(&envelope, self.network)?;

        let mut state = self.state.lock().unwrap();
        state.submitted.push(envelope_xdr.to_string());
        match &state.submit_mode {
            SubmitMode::Accept => Ok(SubmitResponse {
                hash: Some(hash),
                successful: Some(true),
                ledger: Some(51_234_567),
            }),
            SubmitMode::WithoutHash => Ok(SubmitResponse {
                hash: None,
                successful: Some(true),
                ledger: None,
            }),
            SubmitMode::Reject(reason) => Err(BridgeError::SubmissionFailed {
                reason: reason.clone(),
            }),
        }
    }

    fn network(&self) -> StellarNetwork {
        self.network
    }
}

/// An account with an XLM balance and optional USDC/EURC trustlines.
///
/// Amounts are decimal strings as Horizon reports them.
///
/// # Panics
///
/// Panics on an amount that is not a valid Stellar amount.
pub fn test_account(
    account_id: &str,
    xlm: &str,
    usdc: Option<&str>,
    eurc: Option<&str>,
) -> AccountResponse {
    let mut balances = vec![Balance {
        balance: Stroops::parse(xlm).unwrap(),
        asset_type: ASSET_TYPE_NATIVE.to_string(),
        asset_code: None,
        asset_issuer: None,
        limit: None,
    }];
    for (asset, amount) in [(StellarAsset::usdc(), usdc), (StellarAsset::eurc(), eurc)] {
        if let Some(amount) = amount {
            balances.push(Balance {
                balance: Stroops::parse(amount).unwrap(),
                asset_type: asset.asset_type().to_string(),
                asset_code: Some(asset.code().to_string()),
                asset_issuer: Some(asset.issuer().to_string()),
                limit: Some(MAX_TRUST_LIMIT),
            });
        }
    }

    AccountResponse {
        account_id: account_id.to_string(),
        sequence: TEST_ACCOUNT_SEQUENCE,
        balances,
        data: HashMap::new(),
    }
}

// ============================================================================
// Fake Signer and Connector
// ============================================================================

/// A wallet that signs with a fixed key, or declines when told to.
#[derive(Clone)]
pub struct FakeSigner {
    key: KeypairSigner,
    rejection: Arc<Mutex<Option<String>>>,
    sign_count: Arc<Mutex<usize>>,
}

impl Default for FakeSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeSigner {
    pub fn new() -> Self {
        Self {
            key: KeypairSigner::from_bytes([42u8; 32]),
            rejection: Arc::new(Mutex::new(None)),
            sign_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Declines every signature request from now on.
    pub fn reject_with(&self, reason: &str) {
        *self.rejection.lock().unwrap() = Some(reason.to_string());
    }

    pub fn address(&self) -> StellarAddress {
        self.key.address()
    }

    pub fn sign_count(&self) -> usize {
        *self.sign_count.lock().unwrap()
    }
}

#[async_trait]
impl TransactionSigner for FakeSigner {
    async fn sign_transaction(
        &self,
        envelope_xdr: &str,
        network: StellarNetwork,
    ) -> Result<String> {
        tokio::task::yield_now().await;
        *self.sign_count.lock().unwrap() += 1;
        if let Some(reason) = self.rejection.lock().unwrap().clone() {
            return Err(BridgeError::WalletRejected { reason });
        }
        let signed = self
            .key
            .sign_envelope(decode_envelope(envelope_xdr)?, network)?;
        encode_envelope(&signed)
    }
}

#[derive(Default)]
struct ConnectorState {
    connect_count: usize,
    disconnect_count: usize,
    pushed_views: Vec<ConnectorView>,
    connect_failure: Option<BridgeError>,
}

/// A wallet SDK that approves connections to a fixed address.
#[derive(Clone)]
pub struct FakeConnector {
    address: String,
    state: Arc<Mutex<ConnectorState>>,
}

impl FakeConnector {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            state: Arc::new(Mutex::new(ConnectorState::default())),
        }
    }

    /// Makes the next connection attempt fail.
    pub fn fail_connect_with(&self, error: BridgeError) {
        self.state.lock().unwrap().connect_failure = Some(error);
    }

    pub fn connect_count(&self) -> usize {
        self.state.lock().unwrap().connect_count
    }

    pub fn disconnect_count(&self) -> usize {
        self.state.lock().unwrap().disconnect_count
    }

    /// Views the session pushed to the SDK, oldest first.
    pub fn pushed_views(&self) -> Vec<ConnectorView> {
        self.state.lock().unwrap().pushed_views.clone()
    }
}

#[async_trait]
impl WalletConnector for FakeConnector {
    async fn connect(&self, _wallet_id: &str) -> Result<String> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().unwrap();
        state.connect_count += 1;
        match state.connect_failure.take() {
            Some(err) => Err(err),
            None => Ok(self.address.clone()),
        }
    }

    async fn disconnect(&self) -> Result<()> {
        tokio::task::yield_now().await;
        self.state.lock().unwrap().disconnect_count += 1;
        Ok(())
    }

    async fn push_view(&self, view: &ConnectorView) -> Result<()> {
        self.state.lock().unwrap().pushed_views.push(view.clone());
        Ok(())
    }
}

// ============================================================================
// Fake Clock
// ============================================================================

/// A fake clock that advances instantly on sleep.
///
/// This allows testing polling and expiry logic without waiting. Clones
/// share the same time and sleep log.
#[derive(Clone, Debug)]
pub struct FakeClock {
    now: Arc<Mutex<DateTime<Utc>>>,
    sleep_log: Arc<Mutex<Vec<Duration>>>,
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeClock {
    /// Starts at 2025-01-01 00:00:00 UTC.
    pub fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_default();
        Self::starting_at(start)
    }

    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
            sleep_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Moves time forward without recording a sleep.
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::from_std(duration).unwrap();
    }

    pub fn sleep_count(&self) -> usize {
        self.sleep_log.lock().unwrap().len()
    }

    pub fn total_sleep_time(&self) -> Duration {
        self.sleep_log.lock().unwrap().iter().sum()
    }

    pub fn clear_sleep_log(&self) {
        self.sleep_log.lock().unwrap().clear();
    }
}

#[async_trait]
impl Clock for FakeClock {
    async fn sleep(&self, duration: Duration) {
        self.sleep_log.lock().unwrap().push(duration);
        self.advance(duration);
        tokio::task::yield_now().await;
    }

    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

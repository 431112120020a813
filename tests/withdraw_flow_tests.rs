//! Integration tests for the withdrawal flow using fake implementations
//!
//! The flow runs against a fake payment API, a fake Horizon server and a
//! fake wallet, so every step from payment creation to history recording
//! can be observed.

use rozo_bridge::bridge::{WithdrawFlow, WithdrawRequest, WithdrawStep};
use rozo_bridge::cache::QuoteService;
use rozo_bridge::history::{HistoryStatus, HistoryStore};
use rozo_bridge::protocol::{PaymentResponse, PaymentSource};
use rozo_bridge::stellar::{decode_envelope, StellarAddress};
use rozo_bridge::testing::{
    test_account, FakeClock, FakeConnector, FakeLedger, FakeRozoApi, FakeSigner,
    FAKE_RECEIVER_ADDRESS, FAKE_RECEIVER_MEMO, TEST_ACCOUNT_SEQUENCE,
};
use rozo_bridge::wallet::{ActiveCurrency, BalanceTracker, WalletSession};
use rozo_bridge::{BridgeError, ChainId, FeeType, TokenSymbol};
use std::sync::Arc;
use stellar_xdr::curr::{Memo, OperationBody, TransactionEnvelope};

const WALLET: &str = "GA5ZSEJYB37JRC5AVCIA5MOP4RHTM335X2KGX3IHOJAPP5RE34K4KZVN";
const EVM_RECIPIENT: &str = "0x742d35Cc6634c0532925A3b844Bc9e7595f8fa0d";

struct Harness {
    api: FakeRozoApi,
    ledger: FakeLedger,
    signer: FakeSigner,
    history: Arc<HistoryStore>,
    quotes: Arc<QuoteService>,
    balances: Arc<BalanceTracker>,
    wallet: Arc<WalletSession>,
    clock: FakeClock,
}

impl Harness {
    async fn connected() -> Self {
        let api = FakeRozoApi::new();
        let ledger = FakeLedger::new();
        ledger.set_account(test_account(WALLET, "5", Some("100"), None));
        let clock = FakeClock::new();

        let wallet = Arc::new(WalletSession::new(Arc::new(FakeConnector::new(WALLET))));
        wallet.connect("freighter").await.unwrap();

        let balances = Arc::new(BalanceTracker::new(
            Arc::new(ledger.clone()),
            ActiveCurrency::Usdc,
        ));

        Self {
            quotes: Arc::new(QuoteService::from_client(
                Arc::new(api.clone()),
                Arc::new(clock.clone()),
            )),
            history: Arc::new(HistoryStore::in_memory(Arc::new(clock.clone()))),
            signer: FakeSigner::new(),
            api,
            ledger,
            balances,
            wallet,
            clock,
        }
    }

    fn flow(&self, fee_type: FeeType) -> WithdrawFlow {
        WithdrawFlow::builder()
            .payments(Arc::new(self.api.clone()))
            .ledger(Arc::new(self.ledger.clone()))
            .signer(Arc::new(self.signer.clone()))
            .wallet(self.wallet.clone())
            .history(self.history.clone())
            .quotes(self.quotes.clone())
            .balances(self.balances.clone())
            .clock(Arc::new(self.clock.clone()))
            .fee_type(fee_type)
            .build()
    }
}

fn request(amount: &str, fee: &str) -> WithdrawRequest {
    WithdrawRequest::builder()
        .amount(amount)
        .fee(fee)
        .destination_address(EVM_RECIPIENT)
        .destination_chain(ChainId::Base)
        .build()
}

/// Collects every step the flow publishes until it finishes.
fn record_steps(flow: &WithdrawFlow) -> tokio::task::JoinHandle<Vec<WithdrawStep>> {
    let mut steps = flow.subscribe();
    tokio::spawn(async move {
        let mut seen = Vec::new();
        while steps.changed().await.is_ok() {
            let step = steps.borrow_and_update().clone();
            let finished = step.is_finished();
            seen.push(step);
            if finished {
                break;
            }
        }
        seen
    })
}

#[tokio::test]
async fn test_withdraw_publishes_steps_in_order() {
    let harness = Harness::connected().await;
    let flow = harness.flow(FeeType::ExactIn);
    let recorder = record_steps(&flow);

    let receipt = flow.execute(&request("25", "0.25")).await.unwrap();
    let labels: Vec<_> = recorder
        .await
        .unwrap()
        .iter()
        .map(|step| step.label())
        .collect();

    assert_eq!(
        labels,
        vec![
            Some("Creating payment order..."),
            Some("Sign transaction in wallet"),
            Some("Sending to Stellar network..."),
            Some("Withdrawal complete!"),
        ]
    );
    assert_eq!(flow.step(), WithdrawStep::Success(receipt));
}

#[tokio::test]
async fn test_withdraw_builds_payment_and_transaction() {
    let harness = Harness::connected().await;
    let flow = harness.flow(FeeType::ExactIn);

    let receipt = flow.execute(&request("25", "0.25")).await.unwrap();

    let created = harness.api.last_create_request().unwrap();
    assert_eq!(created.to_chain, 8453);
    assert_eq!(created.to_units, "25");
    assert_eq!(created.to_address, EVM_RECIPIENT);
    assert_eq!(created.preferred_chain, Some(1500));
    assert_eq!(created.app_id, "rozoBridgeStellar");
    insta::assert_snapshot!(
        created.metadata.unwrap().items[0].description,
        @"Transfer USDC from Stellar to USDC"
    );

    assert_eq!(receipt.payment_id, "pay_test");
    assert_eq!(receipt.destination_token, TokenSymbol::Usdc);
    assert_eq!(receipt.tx_hash.len(), 64);
    insta::assert_snapshot!(receipt.receipt_url, @"https://invoice.rozo.ai/receipt?id=pay_test");

    let submitted = harness.ledger.submitted_envelopes();
    assert_eq!(submitted.len(), 1);
    let TransactionEnvelope::Tx(v1) = decode_envelope(&submitted[0]).unwrap() else {
        panic!("expected v1 envelope");
    };
    assert_eq!(v1.tx.seq_num.0, TEST_ACCOUNT_SEQUENCE + 1);
    assert_eq!(v1.signatures.len(), 1);
    let Memo::Text(memo) = &v1.tx.memo else {
        panic!("expected text memo");
    };
    assert_eq!(memo.as_slice(), FAKE_RECEIVER_MEMO.as_bytes());
    let OperationBody::Payment(payment) = &v1.tx.operations[0].body else {
        panic!("expected payment");
    };
    assert_eq!(payment.amount, 250_000_000);
    assert_eq!(
        payment.destination,
        StellarAddress::parse(FAKE_RECEIVER_ADDRESS)
            .unwrap()
            .to_muxed_account()
    );
}

#[tokio::test]
async fn test_exact_out_subtracts_fee() {
    let harness = Harness::connected().await;
    let flow = harness.flow(FeeType::ExactOut);

    flow.execute(&request("100", "0.25")).await.unwrap();

    let created = harness.api.last_create_request().unwrap();
    assert_eq!(created.to_units, "99.75");
    assert_eq!(created.fee_type, FeeType::ExactOut);
}

#[tokio::test]
async fn test_default_flow_sends_entered_amount() {
    let harness = Harness::connected().await;
    let flow = WithdrawFlow::builder()
        .payments(Arc::new(harness.api.clone()))
        .ledger(Arc::new(harness.ledger.clone()))
        .signer(Arc::new(harness.signer.clone()))
        .wallet(harness.wallet.clone())
        .history(harness.history.clone())
        .quotes(harness.quotes.clone())
        .clock(Arc::new(harness.clock.clone()))
        .build();
    assert_eq!(flow.fee_type(), FeeType::ExactIn);

    flow.execute(&request("25", "0.25")).await.unwrap();

    let created = harness.api.last_create_request().unwrap();
    assert_eq!(created.to_units, "25");
    assert_eq!(created.fee_type, FeeType::ExactIn);
}

#[tokio::test]
async fn test_success_records_history_and_invalidates_analytics() {
    let harness = Harness::connected().await;
    let flow = harness.flow(FeeType::ExactIn);

    harness.quotes.get_analytics().await.unwrap();
    assert_eq!(harness.api.analytics_call_count(), 1);
    harness
        .balances
        .refresh(&WALLET.parse().unwrap())
        .await
        .unwrap();

    let receipt = flow.execute(&request("25", "0.25")).await.unwrap();

    let items = harness.history.for_wallet(Some(WALLET)).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].payment_id, receipt.payment_id);
    assert_eq!(items[0].status, HistoryStatus::Completed);
    assert_eq!(items[0].source_chain(), Some(ChainId::Stellar));
    assert_eq!(items[0].destination_chain(), Some(ChainId::Base));
    assert_eq!(items[0].source_tx_hash.as_deref(), Some(receipt.tx_hash.as_str()));

    harness.quotes.get_analytics().await.unwrap();
    assert_eq!(harness.api.analytics_call_count(), 2);

    // Initial refresh, sequence lookup, refresh after success.
    assert_eq!(harness.ledger.load_count(), 3);
}

#[tokio::test]
async fn test_rejected_signature_publishes_error() {
    let harness = Harness::connected().await;
    harness.signer.reject_with("User declined access");
    let flow = harness.flow(FeeType::ExactIn);

    let err = flow.execute(&request("25", "0.25")).await.unwrap_err();

    assert!(matches!(err, BridgeError::WalletRejected { .. }));
    let WithdrawStep::Error { message } = flow.step() else {
        panic!("expected error step");
    };
    insta::assert_snapshot!(message, @"Withdrawal failed: Wallet rejected the request: User declined access");
    assert_eq!(harness.ledger.submit_count(), 0);
    assert!(harness.history.get_all().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_payment_id_fails_creation() {
    let harness = Harness::connected().await;
    harness.api.set_create_payment_response(PaymentResponse {
        id: None,
        status: None,
        source: PaymentSource {
            receiver_address: Some(FAKE_RECEIVER_ADDRESS.to_string()),
            ..PaymentSource::default()
        },
        destination: None,
    });
    let flow = harness.flow(FeeType::ExactIn);

    let err = flow.execute(&request("25", "0.25")).await.unwrap_err();

    assert!(matches!(err, BridgeError::PaymentCreationFailed { .. }));
    assert_eq!(harness.signer.sign_count(), 0);
    assert!(flow.step().is_finished());
}

#[tokio::test]
async fn test_submission_without_hash_fails() {
    let harness = Harness::connected().await;
    harness.ledger.omit_submission_hash();
    let flow = harness.flow(FeeType::ExactIn);

    let err = flow.execute(&request("25", "0.25")).await.unwrap_err();

    assert!(matches!(err, BridgeError::SubmissionFailed { .. }));
    assert!(harness.history.get_all().unwrap().is_empty());
}

#[tokio::test]
async fn test_preconditions_publish_no_step() {
    let harness = Harness::connected().await;
    let flow = harness.flow(FeeType::ExactIn);
    let steps = flow.subscribe();

    let bad_address = WithdrawRequest::builder()
        .amount("25")
        .fee("0.25")
        .destination_address("0x1234")
        .destination_chain(ChainId::Base)
        .build();
    assert!(flow.execute(&bad_address).await.unwrap_err().is_validation());
    assert!(flow.execute(&request("", "0.25")).await.is_err());

    assert!(!steps.has_changed().unwrap());
    assert_eq!(harness.api.create_payment_call_count(), 0);
}

#[tokio::test]
async fn test_disconnected_wallet_is_rejected() {
    let harness = Harness::connected().await;
    harness.wallet.disconnect().await.unwrap();
    let flow = harness.flow(FeeType::ExactIn);

    let err = flow.execute(&request("25", "0.25")).await.unwrap_err();
    assert!(matches!(err, BridgeError::WalletNotConnected));
}

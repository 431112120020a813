//! Integration tests for the wallet session, balances and trustlines

use rozo_bridge::providers::{KeypairSigner, KEYPAIR_WALLET_ID};
use rozo_bridge::stellar::{MemoKind, StellarAddress};
use rozo_bridge::testing::{test_account, FakeClock, FakeLedger};
use rozo_bridge::wallet::{
    check_memo_required, ActiveCurrency, BalanceTracker, WalletSession, WalletState,
};
use rozo_bridge::BridgeError;
use std::sync::Arc;

fn keypair() -> Arc<KeypairSigner> {
    Arc::new(KeypairSigner::from_bytes([9u8; 32]))
}

#[tokio::test]
async fn test_keypair_wallet_connects_and_tracks_balances() {
    let signer = keypair();
    let address = signer.address();
    let ledger = Arc::new(FakeLedger::new());
    ledger.set_account(test_account(&address.to_string(), "12", Some("250.5"), None));

    let session = WalletSession::new(signer.clone());
    let mut states = session.subscribe();
    assert_eq!(session.connect(KEYPAIR_WALLET_ID).await.unwrap(), address);
    assert!(states.has_changed().unwrap());
    assert!(states.borrow_and_update().is_connected());

    let tracker = BalanceTracker::new(ledger.clone(), ActiveCurrency::Usdc);
    let balances = tracker.refresh(&session.require_address().unwrap()).await.unwrap();
    assert!(balances.usdc.exists);
    assert!(!balances.eurc.exists);
    assert!(balances.has_enough_xlm());

    session.disconnect().await.unwrap();
    tracker.reset();
    assert_eq!(session.state(), WalletState::Disconnected);
    assert!(!tracker.balances().usdc.exists);
}

#[tokio::test]
async fn test_open_trustline_with_keypair_signer() {
    let signer = keypair();
    let address = signer.address();
    let ledger = Arc::new(FakeLedger::new());
    ledger.set_account(test_account(&address.to_string(), "3", None, None));
    let tracker = BalanceTracker::new(ledger.clone(), ActiveCurrency::Eurc);

    let hash = tracker
        .create_trustline(signer.as_ref(), &FakeClock::new(), &address, ActiveCurrency::Eurc)
        .await
        .unwrap();
    assert_eq!(hash.len(), 64);
    assert_eq!(ledger.submit_count(), 1);

    // The fake ledger does not apply transactions, so the trustline shows
    // up once the account is updated.
    ledger.set_account(test_account(&address.to_string(), "3", None, Some("0")));
    assert!(tracker.refresh(&address).await.unwrap().eurc.exists);
}

#[tokio::test]
async fn test_rejected_submission_is_reported() {
    let signer = keypair();
    let address = signer.address();
    let ledger = Arc::new(FakeLedger::new());
    ledger.set_account(test_account(&address.to_string(), "3", None, None));
    ledger.reject_submissions("tx_insufficient_balance");
    let tracker = BalanceTracker::new(ledger.clone(), ActiveCurrency::Usdc);

    let err = tracker
        .create_trustline(signer.as_ref(), &FakeClock::new(), &address, ActiveCurrency::Usdc)
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::SubmissionFailed { .. }));
    assert!(!tracker.balances().usdc.creating);
}

#[tokio::test]
async fn test_unfunded_account_has_no_balances() {
    let ledger = Arc::new(FakeLedger::new());
    let address: StellarAddress = "GDHU6WRG4IEQXM5NZ4BMPKOXHW76MZM4Y2IEMFDVXBSDP6SJY4ITNPP2"
        .parse()
        .unwrap();
    let tracker = BalanceTracker::new(ledger.clone(), ActiveCurrency::Usdc);

    let err = tracker.refresh(&address).await.unwrap_err();
    assert!(matches!(err, BridgeError::AccountNotFound { .. }));
    assert!(!tracker.has_enough_xlm());
}

#[tokio::test]
async fn test_exchange_account_requires_memo() {
    let ledger = FakeLedger::new();
    let exchange = "GDHU6WRG4IEQXM5NZ4BMPKOXHW76MZM4Y2IEMFDVXBSDP6SJY4ITNPP2";
    let mut account = test_account(exchange, "100", Some("0"), None);
    account
        .data
        .insert("config.memo_required".to_string(), "MQ==".to_string());
    ledger.set_account(account);

    let requirement = check_memo_required(&ledger, &exchange.parse().unwrap()).await;
    assert!(requirement.memo_required);
    assert_eq!(requirement.memo_type, Some(MemoKind::Text));
}

// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Withdraw USDC from Stellar to an EVM chain or Solana
//!
//! Quotes the fee, checks the XLM reserve and trustline, then signs and
//! submits the Stellar payment with a local secret key and waits for the
//! payout. Without `--submit` it stops after the checks.
//!
//! Run with:
//! `STELLAR_SECRET_KEY=S... cargo run --example withdraw -- 0xRecipient 8453 25 [--submit]`

use rozo_bridge::bridge::{pay_amount, SettlementTracker, WithdrawFlow, WithdrawRequest};
use rozo_bridge::cache::QuoteService;
use rozo_bridge::config::{AppContext, BridgeConfig};
use rozo_bridge::providers::{receipt_url, KeypairSigner, TokioClock, KEYPAIR_WALLET_ID};
use rozo_bridge::wallet::{ActiveCurrency, BalanceTracker, WalletSession};
use rozo_bridge::{BridgeError, ChainId, FeeType};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), BridgeError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rozo_bridge=info")))
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (Some(destination), Some(chain), Some(amount)) = (args.first(), args.get(1), args.get(2))
    else {
        eprintln!("usage: withdraw <destination address> <chain id> <amount> [--submit]");
        std::process::exit(2);
    };
    let submit = args.iter().any(|a| a == "--submit");
    let destination_chain = chain
        .parse::<u64>()
        .ok()
        .and_then(ChainId::from_u64)
        .ok_or_else(|| BridgeError::InvalidConfig(format!("unknown chain id {chain}")))?;

    let secret = std::env::var("STELLAR_SECRET_KEY")
        .map_err(|_| BridgeError::InvalidConfig("STELLAR_SECRET_KEY is not set".to_string()))?;

    let config = BridgeConfig::from_env()?;
    let context = AppContext::from_query("", &config.app_id);
    let clock = Arc::new(TokioClock::new());
    let rozo = Arc::new(config.rozo_client()?);
    let ledger = Arc::new(config.horizon_client()?);
    let history = Arc::new(config.history_store(clock.clone())?);
    let quotes = Arc::new(QuoteService::from_client(rozo.clone(), clock.clone()));

    println!("Stellar to {destination_chain} withdrawal");
    println!("=================================\n");

    let signer = Arc::new(KeypairSigner::from_secret(&secret)?);
    let wallet = Arc::new(WalletSession::new(signer.clone()));
    let address = wallet.connect(KEYPAIR_WALLET_ID).await?;
    println!("Wallet:  {address}");

    let balances = Arc::new(BalanceTracker::new(ledger.clone(), ActiveCurrency::Usdc));
    let current = balances.refresh(&address).await?;
    println!("XLM:     {}", current.xlm.balance);
    println!("USDC:    {}", current.usdc.balance);
    if !current.has_enough_xlm() {
        return Err(BridgeError::InsufficientXlm {
            balance: current.xlm.balance.to_string(),
        });
    }
    if !current.usdc.exists {
        return Err(BridgeError::TrustlineMissing {
            account: address.to_string(),
            asset: ActiveCurrency::Usdc.asset().to_string(),
        });
    }

    let quote = quotes
        .get_fee(&context.fee_query(amount.as_str(), FeeType::ExactIn))
        .await?;
    let fee = format!("{:.2}", quote.fee);
    println!("Fee:     {fee} ({})", quote.fee_percentage);
    println!(
        "Payout:  {} on {destination_chain}",
        pay_amount(FeeType::ExactIn, amount, &fee)?
    );

    if !submit {
        println!("\nDry run. Pass --submit to sign and send the payment.");
        return Ok(());
    }

    let flow = WithdrawFlow::builder()
        .payments(rozo.clone())
        .ledger(ledger)
        .signer(signer)
        .wallet(wallet)
        .history(history.clone())
        .quotes(quotes)
        .balances(balances)
        .clock(clock.clone())
        .app_id(context.app_id.as_str())
        .build();

    let mut steps = flow.subscribe();
    let progress = tokio::spawn(async move {
        while steps.changed().await.is_ok() {
            let step = steps.borrow_and_update().clone();
            if let Some(label) = step.label() {
                println!("  {label}");
            }
            if step.is_finished() {
                break;
            }
        }
    });

    let receipt = flow
        .execute(
            &WithdrawRequest::builder()
                .amount(amount.as_str())
                .fee(fee)
                .destination_address(destination.as_str())
                .destination_chain(destination_chain)
                .build(),
        )
        .await;
    let _ = progress.await;
    let receipt = receipt?;

    println!("\nStellar tx: {}", receipt.tx_hash);
    println!("Receipt:    {}", receipt_url(&receipt.payment_id));

    let payment = SettlementTracker::new(rozo, history, clock)
        .wait_for_settlement(&receipt.payment_id)
        .await?;
    println!(
        "Payout tx:  {}",
        payment.destination_tx_hash().unwrap_or("(not reported)")
    );

    Ok(())
}

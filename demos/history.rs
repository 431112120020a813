//! List the local transfer history
//!
//! Imports transfers saved in the old per-wallet format, then prints the
//! history, optionally for one wallet. Pending transfers older than an hour
//! show as expired.
//!
//! Run with: `ROZO_HISTORY_PATH=./history cargo run --example history -- [G...]`

use rozo_bridge::config::BridgeConfig;
use rozo_bridge::history::HistoryStatus;
use rozo_bridge::providers::TokioClock;
use rozo_bridge::validation::format_token_amount;
use rozo_bridge::BridgeError;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<(), BridgeError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rozo_bridge=info")))
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let config = BridgeConfig::from_env()?;
    if config.history_path.is_none() {
        println!("ROZO_HISTORY_PATH is not set; history is kept in memory only.");
    }
    let store = config.history_store(Arc::new(TokioClock::new()))?;

    let imported = store.migrate_legacy()?;
    if imported > 0 {
        println!("Imported {imported} transfers from the old format.\n");
    }

    let wallet = std::env::args().nth(1);
    let items = match wallet.as_deref() {
        Some(address) => store.for_wallet(Some(address))?,
        None => store.get_all()?,
    };

    if items.is_empty() {
        println!("No transfers yet.");
        return Ok(());
    }

    for item in &items {
        let marker = match item.status {
            HistoryStatus::Completed => "✓",
            HistoryStatus::Pending => "…",
            HistoryStatus::Failed => "✗",
            HistoryStatus::Expired => "⌛",
        };
        println!(
            "{marker} {}  {} {} {} -> {}  ({})",
            item.completed_at.format("%Y-%m-%d %H:%M"),
            format_token_amount(&item.amount, 2),
            item.source_token_symbol,
            item.source_chain_name,
            item.destination_chain_name,
            item.payment_id,
        );
    }
    println!("\n{} transfers", items.len());

    Ok(())
}

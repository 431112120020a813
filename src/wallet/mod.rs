//! Stellar wallet session, balances and trustlines

mod balances;
mod state;
mod trustline;

pub use balances::{
    check_memo_required, check_token_trustline, ActiveCurrency, BalanceTracker, Balances,
    TrustlineCheck, TrustlineStatus, XlmBalance, MIN_XLM_BALANCE,
};
pub use state::{ConnectorView, WalletSession, WalletState};

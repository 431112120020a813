use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::{debug, warn, Instrument};

use crate::chain::TokenSymbol;
use crate::error::{BridgeError, Result};
use crate::protocol::AccountResponse;
use crate::spans;
use crate::stellar::{MemoRequirement, StellarAddress, StellarAsset, Stroops};
use crate::traits::LedgerProvider;

/// XLM an account should hold before it can pay fees and open trustlines.
pub const MIN_XLM_BALANCE: Stroops = Stroops::new(15_000_000);

/// Result of a one-off trustline lookup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrustlineCheck {
    pub exists: bool,
    pub balance: Stroops,
}

/// Trustline view for one asset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrustlineStatus {
    pub exists: bool,
    pub balance: Stroops,
    pub checking: bool,
    pub creating: bool,
}

impl TrustlineStatus {
    fn apply(&mut self, check: TrustlineCheck) {
        self.exists = check.exists;
        self.balance = check.balance;
        self.checking = false;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct XlmBalance {
    pub balance: Stroops,
    pub checking: bool,
}

/// Everything [`BalanceTracker`] publishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Balances {
    pub xlm: XlmBalance,
    pub usdc: TrustlineStatus,
    pub eurc: TrustlineStatus,
    /// Currency the app is configured for
    pub active_currency: ActiveCurrency,
}

/// USDC or EURC; the only assets with Stellar trustlines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ActiveCurrency {
    #[default]
    Usdc,
    Eurc,
}

impl ActiveCurrency {
    pub fn symbol(self) -> TokenSymbol {
        match self {
            Self::Usdc => TokenSymbol::Usdc,
            Self::Eurc => TokenSymbol::Eurc,
        }
    }

    pub fn asset(self) -> StellarAsset {
        match self {
            Self::Usdc => StellarAsset::usdc(),
            Self::Eurc => StellarAsset::eurc(),
        }
    }
}

impl TryFrom<TokenSymbol> for ActiveCurrency {
    type Error = BridgeError;

    fn try_from(symbol: TokenSymbol) -> Result<Self> {
        match symbol {
            TokenSymbol::Usdc => Ok(Self::Usdc),
            TokenSymbol::Eurc => Ok(Self::Eurc),
            other => Err(BridgeError::UnsupportedRoute {
                reason: format!("{other} has no Stellar trustline"),
            }),
        }
    }
}

impl Balances {
    /// Trustline view of the active currency.
    pub fn active_trustline(&self) -> TrustlineStatus {
        self.trustline(self.active_currency)
    }

    pub fn trustline(&self, currency: ActiveCurrency) -> TrustlineStatus {
        match currency {
            ActiveCurrency::Usdc => self.usdc,
            ActiveCurrency::Eurc => self.eurc,
        }
    }

    fn trustline_mut(&mut self, currency: ActiveCurrency) -> &mut TrustlineStatus {
        match currency {
            ActiveCurrency::Usdc => &mut self.usdc,
            ActiveCurrency::Eurc => &mut self.eurc,
        }
    }

    pub fn has_enough_xlm(&self) -> bool {
        self.xlm.balance >= MIN_XLM_BALANCE
    }
}

fn trustline_from(account: &AccountResponse, asset: &StellarAsset) -> TrustlineCheck {
    match account.asset_balance(asset) {
        Some(balance) => TrustlineCheck {
            exists: true,
            balance: balance.balance,
        },
        None => TrustlineCheck::default(),
    }
}

/// Looks up whether `address` trusts `asset`.
///
/// An account that does not exist yet has no trustlines.
pub async fn check_token_trustline(
    ledger: &dyn LedgerProvider,
    address: &StellarAddress,
    asset: &StellarAsset,
) -> Result<TrustlineCheck> {
    match ledger.load_account(address).await {
        Ok(account) => Ok(trustline_from(&account, asset)),
        Err(BridgeError::AccountNotFound { .. }) => Ok(TrustlineCheck::default()),
        Err(e) => Err(e),
    }
}

/// SEP-29 check on a destination account.
///
/// Lookup failures read as "no memo required".
pub async fn check_memo_required(
    ledger: &dyn LedgerProvider,
    address: &StellarAddress,
) -> MemoRequirement {
    match ledger.load_account(address).await {
        Ok(account) => MemoRequirement::from_data_entry(account.memo_required_entry()),
        Err(e) => {
            debug!(address = %address, error = %e, event = "memo_required_lookup_failed");
            MemoRequirement::NOT_REQUIRED
        }
    }
}

/// Balance and trustline views for the connected account
///
/// Every refresh does one account lookup and updates all views from it.
pub struct BalanceTracker {
    ledger: Arc<dyn LedgerProvider>,
    balances: watch::Sender<Balances>,
    refresh_lock: tokio::sync::Mutex<()>,
    last_address: Mutex<Option<StellarAddress>>,
}

impl BalanceTracker {
    pub fn new(ledger: Arc<dyn LedgerProvider>, active_currency: ActiveCurrency) -> Self {
        let (balances, _) = watch::channel(Balances {
            active_currency,
            ..Balances::default()
        });
        Self {
            ledger,
            balances,
            refresh_lock: tokio::sync::Mutex::new(()),
            last_address: Mutex::new(None),
        }
    }

    pub fn ledger(&self) -> &Arc<dyn LedgerProvider> {
        &self.ledger
    }

    pub fn subscribe(&self) -> watch::Receiver<Balances> {
        self.balances.subscribe()
    }

    pub fn balances(&self) -> Balances {
        *self.balances.borrow()
    }

    pub fn has_enough_xlm(&self) -> bool {
        self.balances().has_enough_xlm()
    }

    pub fn set_active_currency(&self, currency: ActiveCurrency) {
        self.balances
            .send_if_modified(|b| std::mem::replace(&mut b.active_currency, currency) != currency);
    }

    /// Reloads the account and updates every view.
    ///
    /// On failure all views reset to "no trustline, zero balance" and the
    /// error is returned.
    pub async fn refresh(&self, address: &StellarAddress) -> Result<Balances> {
        let span = spans::refresh_balances(&address.to_string());
        async {
            let _refresh = self.refresh_lock.lock().await;
            *self
                .last_address
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(*address);

            self.balances.send_modify(|b| {
                b.xlm.checking = true;
                b.usdc.checking = true;
                b.eurc.checking = true;
            });

            match self.ledger.load_account(address).await {
                Ok(account) => {
                    let usdc = trustline_from(&account, &StellarAsset::usdc());
                    let eurc = trustline_from(&account, &StellarAsset::eurc());
                    let xlm = account.native_balance().unwrap_or_default();
                    self.balances.send_modify(|b| {
                        b.xlm = XlmBalance {
                            balance: xlm,
                            checking: false,
                        };
                        b.usdc.apply(usdc);
                        b.eurc.apply(eurc);
                    });
                    debug!(
                        xlm = %xlm,
                        usdc_trustline = usdc.exists,
                        eurc_trustline = eurc.exists,
                        event = "balances_refreshed"
                    );
                    Ok(self.balances())
                }
                Err(e) => {
                    warn!(error = %e, event = "balance_refresh_failed");
                    self.balances.send_modify(|b| {
                        b.xlm = XlmBalance::default();
                        b.usdc.apply(TrustlineCheck::default());
                        b.eurc.apply(TrustlineCheck::default());
                    });
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Re-runs the last refresh, if there was one.
    pub async fn refresh_last(&self) -> Result<Option<Balances>> {
        let last = *self
            .last_address
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match last {
            Some(address) => self.refresh(&address).await.map(Some),
            None => Ok(None),
        }
    }

    /// Clears every view, e.g. after the wallet disconnects.
    pub fn reset(&self) {
        *self
            .last_address
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.balances.send_modify(|b| {
            *b = Balances {
                active_currency: b.active_currency,
                ..Balances::default()
            }
        });
    }

    pub(crate) fn set_creating(&self, currency: ActiveCurrency, creating: bool) {
        self.balances
            .send_modify(|b| b.trustline_mut(currency).creating = creating);
    }
}

use bon::Builder;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::QuoteService;
use crate::chain::{ChainId, TokenSymbol, STELLAR_EURC, STELLAR_USDC};
use crate::config::DEFAULT_APP_ID;
use crate::error::{BridgeError, Result};
use crate::history::{BridgeHistoryItem, HistoryStatus, HistoryStore, NewHistoryEntry};
use crate::protocol::{
    CreatePaymentRequest, FeeType, IntentPayConfig, PaymentCompletedEvent, PaymentMetadata,
    PaymentResponse,
};
use crate::stellar::StellarAddress;
use crate::traits::PaymentProvider;
use crate::validation::validate_amount;
use crate::wallet::{ActiveCurrency, BalanceTracker, WalletSession};

/// A deposit into Stellar as entered by the user
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
pub struct DepositRequest {
    #[builder(into)]
    pub amount: String,
    #[builder(default = ActiveCurrency::Usdc)]
    pub currency: ActiveCurrency,
    /// Memo the receiving account expects, if any.
    #[builder(into)]
    pub memo: Option<String>,
    /// Manually entered recipient. The connected wallet is used otherwise.
    #[builder(into)]
    pub destination_address: Option<String>,
    /// Trustline check result for the manual recipient.
    #[builder(default)]
    pub manual_trustline_exists: bool,
}

/// Prepares hosted-checkout payments that pay out on Stellar
///
/// The payer side runs in the hosted checkout; this planner builds its
/// configuration, optionally creates the payment directly, and records the
/// transfer once the checkout reports completion.
#[derive(Builder)]
pub struct DepositPlanner {
    payments: Arc<dyn PaymentProvider>,
    wallet: Arc<WalletSession>,
    history: Arc<HistoryStore>,
    quotes: Option<Arc<QuoteService>>,
    balances: Option<Arc<BalanceTracker>>,
    #[builder(into, default = DEFAULT_APP_ID.to_string())]
    app_id: String,
    #[builder(default)]
    fee_type: FeeType,
}

impl DepositPlanner {
    /// Builds the checkout configuration for a deposit.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::InvalidAmount`] for a missing or non-positive amount
    /// - [`BridgeError::InvalidAddress`] for a malformed manual recipient
    /// - [`BridgeError::WalletNotConnected`] with neither a manual recipient
    ///   nor a connected wallet
    /// - [`BridgeError::TrustlineMissing`] when the recipient cannot hold
    ///   the token
    pub fn prepare(&self, request: &DepositRequest) -> Result<IntentPayConfig> {
        validate_amount(&request.amount, None, None)?;

        let manual = request
            .destination_address
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty());

        let (target, has_trustline) = match manual {
            Some(address) => (
                StellarAddress::parse(address)?,
                request.manual_trustline_exists,
            ),
            None => {
                let address = self.wallet.require_address()?;
                let exists = self
                    .balances
                    .as_ref()
                    .is_some_and(|b| b.balances().trustline(request.currency).exists);
                (address, exists)
            }
        };

        if !has_trustline {
            return Err(BridgeError::TrustlineMissing {
                account: target.to_string(),
                asset: request.currency.asset().to_string(),
            });
        }

        let symbol = request.currency.symbol();
        let token = match request.currency {
            ActiveCurrency::Usdc => STELLAR_USDC,
            ActiveCurrency::Eurc => STELLAR_EURC,
        };
        let preferred_symbol = match request.currency {
            ActiveCurrency::Usdc => vec![TokenSymbol::Usdc, TokenSymbol::Usdt],
            ActiveCurrency::Eurc => vec![TokenSymbol::Eurc],
        };

        let config = IntentPayConfig {
            app_id: self.app_id.clone(),
            fee_type: self.fee_type,
            to_chain: token.chain.as_u64(),
            to_token: token.address.to_string(),
            to_address: target.to_string(),
            to_units: request.amount.trim().to_string(),
            preferred_symbol,
            metadata: PaymentMetadata::new("Deposit", format!("Transfer {symbol} to Stellar")),
            receiver_memo: request
                .memo
                .as_deref()
                .map(str::trim)
                .filter(|memo| !memo.is_empty())
                .map(str::to_string),
        };
        debug!(to_address = %config.to_address, to_units = %config.to_units, event = "deposit_prepared");
        Ok(config)
    }

    /// Creates the payment for a prepared configuration.
    pub async fn submit(&self, config: &IntentPayConfig) -> Result<PaymentResponse> {
        let payment = self
            .payments
            .create_payment(&CreatePaymentRequest::from(config))
            .await?;

        match payment.id.as_deref() {
            Some(id) if !id.is_empty() => {
                info!(payment_id = id, event = "deposit_payment_created");
                Ok(payment)
            }
            _ => Err(BridgeError::PaymentCreationFailed {
                reason: "response has no payment id".to_string(),
            }),
        }
    }

    /// Records a finished checkout.
    ///
    /// The transfer is saved only when a wallet is connected and the event
    /// carries a payment id. Balances are refreshed and analytics
    /// invalidated either way.
    pub async fn on_payment_completed(
        &self,
        config: &IntentPayConfig,
        event: &PaymentCompletedEvent,
    ) -> Result<Option<BridgeHistoryItem>> {
        let wallet = self.wallet.address();
        let payment_id = event
            .rozo_payment_id
            .as_deref()
            .filter(|id| !id.is_empty());

        let saved = match (wallet, payment_id) {
            (Some(wallet), Some(payment_id)) => {
                let symbol = deposit_symbol(config);
                let source_chain = event
                    .chain_id
                    .and_then(ChainId::from_u64)
                    .unwrap_or(ChainId::Base);
                let entry = NewHistoryEntry::builder()
                    .wallet_address(wallet.to_string())
                    .payment_id(payment_id)
                    .rozo_payment_id(payment_id)
                    .amount(config.to_units.as_str())
                    .source_chain(source_chain)
                    .source_token(symbol)
                    .destination_chain(ChainId::Stellar)
                    .destination_token(symbol)
                    .destination_address(config.to_address.as_str())
                    .maybe_source_tx_hash(event.tx_hash.clone())
                    .status(HistoryStatus::Completed)
                    .build();
                Some(self.history.save(entry)?)
            }
            _ => {
                debug!(
                    wallet_connected = wallet.is_some(),
                    has_payment_id = payment_id.is_some(),
                    event = "deposit_not_recorded"
                );
                None
            }
        };

        if let (Some(balances), Some(wallet)) = (&self.balances, wallet) {
            if let Err(e) = balances.refresh(&wallet).await {
                warn!(error = %e, event = "balance_refresh_after_deposit_failed");
            }
        }
        if let Some(quotes) = &self.quotes {
            quotes.invalidate_analytics();
        }

        Ok(saved)
    }
}

fn deposit_symbol(config: &IntentPayConfig) -> TokenSymbol {
    if config.preferred_symbol.contains(&TokenSymbol::Eurc) {
        TokenSymbol::Eurc
    } else {
        TokenSymbol::Usdc
    }
}

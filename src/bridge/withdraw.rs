use bon::Builder;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn, Instrument};

use crate::cache::QuoteService;
use crate::chain::{withdrawal_destination_token, ChainId, Token, TokenSymbol, STELLAR_USDC};
use crate::config::DEFAULT_APP_ID;
use crate::error::{BridgeError, Result};
use crate::history::{HistoryStatus, HistoryStore, NewHistoryEntry};
use crate::protocol::{CreatePaymentRequest, FeeType, PaymentMetadata, PaymentResponse};
use crate::providers::receipt_url;
use crate::spans;
use crate::stellar::{PaymentTransaction, StellarAddress, StellarMemo, Stroops};
use crate::traits::{Clock, LedgerProvider, PaymentProvider, TransactionSigner};
use crate::validation::validate_address;
use crate::wallet::{ActiveCurrency, BalanceTracker, WalletSession};

/// Progress of a withdrawal
///
/// A run moves `Idle -> CreatePayment -> SignTransaction ->
/// SubmitTransaction` and ends in `Success` or `Error`. Each step is
/// published once on [`WithdrawFlow::subscribe`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WithdrawStep {
    #[default]
    Idle,
    CreatePayment,
    SignTransaction { payment_id: String },
    SubmitTransaction { payment_id: String },
    Success(WithdrawReceipt),
    /// Carries the short message shown to the user.
    Error { message: String },
}

impl WithdrawStep {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Error { .. })
    }

    /// Status line for the step, `None` while idle.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::Idle => None,
            Self::CreatePayment => Some("Creating payment order..."),
            Self::SignTransaction { .. } => Some("Sign transaction in wallet"),
            Self::SubmitTransaction { .. } => Some("Sending to Stellar network..."),
            Self::Success(_) => Some("Withdrawal complete!"),
            Self::Error { .. } => Some("Withdrawal failed. Please try again."),
        }
    }
}

/// What the user asked to withdraw
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
pub struct WithdrawRequest {
    /// Amount entered by the user, in token units.
    #[builder(into)]
    pub amount: String,
    /// Quoted fee, in token units.
    #[builder(into)]
    pub fee: String,
    #[builder(default = ActiveCurrency::Usdc)]
    pub currency: ActiveCurrency,
    #[builder(into)]
    pub destination_address: String,
    pub destination_chain: ChainId,
}

/// Result of a submitted withdrawal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawReceipt {
    pub payment_id: String,
    /// Stellar ledger transaction hash
    pub tx_hash: String,
    pub receipt_url: String,
    pub destination_chain: ChainId,
    pub destination_token: TokenSymbol,
    pub payment: PaymentResponse,
}

/// Stellar to EVM/Solana withdrawal
///
/// Creates an intent payment, has the wallet sign a Stellar payment to the
/// payment's receiver, and submits it. On success the transfer is saved to
/// history as `completed`, the analytics cache is invalidated and the
/// balances are refreshed.
///
/// Nothing is retried. Calling [`WithdrawFlow::execute`] again starts over.
///
/// # Example
///
/// ```rust,no_run
/// use rozo_bridge::bridge::{WithdrawFlow, WithdrawRequest};
/// use rozo_bridge::history::HistoryStore;
/// use rozo_bridge::providers::{HorizonClient, KeypairSigner, RozoApiClient, TokioClock};
/// use rozo_bridge::stellar::StellarNetwork;
/// use rozo_bridge::wallet::WalletSession;
/// use rozo_bridge::ChainId;
/// use std::sync::Arc;
///
/// # async fn example(secret: &str) -> Result<(), rozo_bridge::BridgeError> {
/// let clock = Arc::new(TokioClock);
/// let signer = Arc::new(KeypairSigner::from_secret(secret)?);
/// let wallet = Arc::new(WalletSession::new(signer.clone()));
/// wallet.connect(rozo_bridge::providers::KEYPAIR_WALLET_ID).await?;
///
/// let flow = WithdrawFlow::builder()
///     .payments(Arc::new(RozoApiClient::production()?))
///     .ledger(Arc::new(HorizonClient::for_network(StellarNetwork::Public)?))
///     .signer(signer)
///     .wallet(wallet)
///     .history(Arc::new(HistoryStore::in_memory(clock.clone())))
///     .clock(clock)
///     .build();
///
/// let receipt = flow
///     .execute(
///         &WithdrawRequest::builder()
///             .amount("25")
///             .fee("0.25")
///             .destination_address("0x742d35Cc6634c0532925A3b844Bc9e7595f8fa0d")
///             .destination_chain(ChainId::Base)
///             .build(),
///     )
///     .await?;
/// println!("receipt: {}", receipt.receipt_url);
/// # Ok(())
/// # }
/// ```
#[derive(Builder)]
pub struct WithdrawFlow {
    payments: Arc<dyn PaymentProvider>,
    ledger: Arc<dyn LedgerProvider>,
    signer: Arc<dyn TransactionSigner>,
    wallet: Arc<WalletSession>,
    history: Arc<HistoryStore>,
    quotes: Option<Arc<QuoteService>>,
    balances: Option<Arc<BalanceTracker>>,
    clock: Arc<dyn Clock>,
    #[builder(into, default = DEFAULT_APP_ID.to_string())]
    app_id: String,
    #[builder(default)]
    fee_type: FeeType,
    #[builder(skip = watch::channel(WithdrawStep::Idle).0)]
    steps: watch::Sender<WithdrawStep>,
}

impl WithdrawFlow {
    pub fn subscribe(&self) -> watch::Receiver<WithdrawStep> {
        self.steps.subscribe()
    }

    pub fn step(&self) -> WithdrawStep {
        self.steps.borrow().clone()
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn fee_type(&self) -> FeeType {
        self.fee_type
    }

    /// Clears a finished run back to `Idle`.
    pub fn reset(&self) {
        self.steps.send_if_modified(|step| {
            let changed = *step != WithdrawStep::Idle;
            *step = WithdrawStep::Idle;
            changed
        });
    }

    /// Runs one withdrawal.
    ///
    /// Missing wallet, amount or fee and an invalid destination address are
    /// rejected before any step is published.
    pub async fn execute(&self, request: &WithdrawRequest) -> Result<WithdrawReceipt> {
        let source = self.wallet.require_address()?;
        if request.amount.trim().is_empty() || request.fee.trim().is_empty() {
            return Err(BridgeError::InvalidAmount {
                reason: "amount and fee are required".to_string(),
            });
        }
        let destination_address =
            validate_address(request.destination_address.trim(), request.destination_chain)?;

        let span = spans::withdraw(
            &source.to_string(),
            request.destination_chain,
            &request.amount,
        );

        async {
            self.reset();
            match self.run(&source, request, &destination_address).await {
                Ok(receipt) => {
                    let current = tracing::Span::current();
                    current.record("payment_id", receipt.payment_id.as_str());
                    current.record("tx_hash", receipt.tx_hash.as_str());
                    info!(
                        payment_id = %receipt.payment_id,
                        tx_hash = %receipt.tx_hash,
                        event = "withdrawal_submitted"
                    );

                    self.record_success(&source, request, &destination_address, &receipt);
                    self.publish(WithdrawStep::Success(receipt.clone()));
                    self.after_success().await;
                    Ok(receipt)
                }
                Err(e) => {
                    spans::record_error(&e);
                    error!(error = %e, event = "withdrawal_failed");
                    self.publish(WithdrawStep::Error {
                        message: e.user_message("Withdrawal"),
                    });
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        source: &StellarAddress,
        request: &WithdrawRequest,
        destination_address: &str,
    ) -> Result<WithdrawReceipt> {
        self.publish(WithdrawStep::CreatePayment);

        let destination = withdrawal_destination_token(request.destination_chain)?;
        let to_units = pay_amount(self.fee_type, &request.amount, &request.fee)?;
        let payment = self
            .payments
            .create_payment(&self.payment_request(&destination, destination_address, &to_units))
            .await?;

        let payment_id = payment
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| BridgeError::PaymentCreationFailed {
                reason: "response has no payment id".to_string(),
            })?;
        let receiver = payment
            .source
            .receiver_address
            .as_deref()
            .filter(|address| !address.is_empty())
            .ok_or_else(|| BridgeError::PaymentCreationFailed {
                reason: "response has no receiver address".to_string(),
            })
            .and_then(StellarAddress::parse)?;
        info!(payment_id = %payment_id, to_units = %to_units, event = "payment_created");

        self.publish(WithdrawStep::SignTransaction {
            payment_id: payment_id.clone(),
        });

        let account = self.ledger.load_account(source).await?;
        let amount = match payment.source.amount.as_deref() {
            Some(amount) => parse_amount(amount)?,
            None => Stroops::ZERO,
        };
        let memo = match payment.source.receiver_memo.as_deref() {
            Some(memo) if !memo.is_empty() => StellarMemo::text(memo)?,
            _ => StellarMemo::None,
        };

        let network = self.ledger.network();
        let unsigned = PaymentTransaction::builder()
            .source(*source)
            .sequence(account.sequence)
            .destination(receiver)
            .asset(request.currency.asset())
            .amount(amount)
            .memo(memo)
            .now_unix(self.clock.now().timestamp().max(0) as u64)
            .build()
            .into_unsigned()?;

        let signed = self
            .signer
            .sign_transaction(&unsigned.to_envelope_xdr()?, network)
            .instrument(spans::sign_transaction(
                &source.to_string(),
                network,
                unsigned.sequence(),
            ))
            .await?;

        self.publish(WithdrawStep::SubmitTransaction {
            payment_id: payment_id.clone(),
        });

        let tx_hash = self
            .ledger
            .submit_transaction(&signed)
            .await?
            .hash
            .filter(|hash| !hash.is_empty())
            .ok_or_else(|| BridgeError::SubmissionFailed {
                reason: "no transaction hash returned".to_string(),
            })?;

        Ok(WithdrawReceipt {
            receipt_url: receipt_url(&payment_id),
            payment_id,
            tx_hash,
            destination_chain: request.destination_chain,
            destination_token: destination.symbol,
            payment,
        })
    }

    fn payment_request(
        &self,
        destination: &Token,
        destination_address: &str,
        to_units: &str,
    ) -> CreatePaymentRequest {
        CreatePaymentRequest::builder()
            .app_id(self.app_id.as_str())
            .fee_type(self.fee_type)
            .to_chain(destination.chain.as_u64())
            .to_token(destination.address)
            .to_address(destination_address)
            .to_units(to_units)
            .preferred_chain(STELLAR_USDC.chain.as_u64())
            .preferred_token_address(STELLAR_USDC.address)
            .metadata(PaymentMetadata::new(
                "Withdraw",
                format!("Transfer USDC from Stellar to {}", destination.symbol),
            ))
            .build()
    }

    fn record_success(
        &self,
        source: &StellarAddress,
        request: &WithdrawRequest,
        destination_address: &str,
        receipt: &WithdrawReceipt,
    ) {
        let entry = NewHistoryEntry::builder()
            .wallet_address(source.to_string())
            .payment_id(receipt.payment_id.as_str())
            .amount(request.amount.trim())
            .source_chain(ChainId::Stellar)
            .source_token(request.currency.symbol())
            .destination_chain(request.destination_chain)
            .destination_token(receipt.destination_token)
            .destination_address(destination_address)
            .source_tx_hash(receipt.tx_hash.as_str())
            .status(HistoryStatus::Completed)
            .build();

        if let Err(e) = self.history.save(entry) {
            warn!(error = %e, payment_id = %receipt.payment_id, event = "history_save_failed");
        }
    }

    async fn after_success(&self) {
        if let Some(quotes) = &self.quotes {
            quotes.invalidate_analytics();
        }
        if let Some(balances) = &self.balances {
            if let Err(e) = balances.refresh_last().await {
                warn!(error = %e, event = "balance_refresh_after_withdrawal_failed");
            }
        }
    }

    fn publish(&self, step: WithdrawStep) {
        self.steps.send_replace(step);
    }
}

/// Amount the destination should receive.
///
/// `ExactIn` sends the entered amount as is. `ExactOut` subtracts the fee
/// and rounds to two decimals.
///
/// ```rust
/// use rozo_bridge::bridge::pay_amount;
/// use rozo_bridge::protocol::FeeType;
///
/// assert_eq!(pay_amount(FeeType::ExactOut, "100", "0.25")?, "99.75");
/// assert_eq!(pay_amount(FeeType::ExactIn, "100", "0.25")?, "100");
/// # Ok::<(), rozo_bridge::BridgeError>(())
/// ```
pub fn pay_amount(fee_type: FeeType, amount: &str, fee: &str) -> Result<String> {
    let amount = amount.trim();
    match fee_type {
        FeeType::ExactIn => {
            if !parse_amount(amount)?.is_positive() {
                return Err(BridgeError::InvalidAmount {
                    reason: "Amount must be greater than 0".to_string(),
                });
            }
            Ok(amount.to_string())
        }
        FeeType::ExactOut => parse_amount(amount)?
            .checked_sub(parse_amount(fee)?)
            .filter(|net| net.is_positive())
            .map(|net| net.format_fixed(2))
            .ok_or_else(|| BridgeError::InvalidAmount {
                reason: "Amount must be greater than the fee".to_string(),
            }),
    }
}

/// Decimal amounts as sent by the APIs, falling back to float parsing for
/// values with more than seven decimals.
fn parse_amount(value: &str) -> Result<Stroops> {
    Stroops::parse(value).or_else(|e| match value.trim().parse::<f64>() {
        Ok(parsed) => Stroops::from_f64(parsed),
        Err(_) => Err(e),
    })
}

// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
use tracing::{info, warn, Instrument};

use super::balances::{ActiveCurrency, BalanceTracker};
use crate::error::{BridgeError, Result};
use crate::spans;
use crate::stellar::{ChangeTrustTransaction, StellarAddress};
use crate::traits::{Clock, TransactionSigner};

impl BalanceTracker {
    /// Opens a trustline for `currency` on `address`.
    ///
    /// Loads a fresh sequence number, has the signer sign a change-trust
    /// transaction, submits it, then refreshes the views. The `creating`
    /// flag of that currency is set while this runs. Returns the ledger
    /// transaction hash.
    pub async fn create_trustline(
        &self,
        signer: &dyn TransactionSigner,
        clock: &dyn Clock,
        address: &StellarAddress,
        currency: ActiveCurrency,
    ) -> Result<String> {
        let asset = currency.asset();
        let span = spans::create_trustline(&address.to_string(), &asset.to_string());

        async {
            self.set_creating(currency, true);
            let result = self.submit_change_trust(signer, clock, address, currency).await;
            self.set_creating(currency, false);

            match &result {
                Ok(hash) => {
                    tracing::Span::current().record("tx_hash", hash.as_str());
                    info!(tx_hash = %hash, currency = %currency.symbol(), event = "trustline_created");
                    if let Err(e) = self.refresh(address).await {
                        warn!(error = %e, event = "balance_refresh_after_trustline_failed");
                    }
                }
                Err(e) => spans::record_error(e),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn submit_change_trust(
        &self,
        signer: &dyn TransactionSigner,
        clock: &dyn Clock,
        address: &StellarAddress,
        currency: ActiveCurrency,
    ) -> Result<String> {
        let ledger = self.ledger();
        let network = ledger.network();
        let account = ledger.load_account(address).await?;

        let unsigned = ChangeTrustTransaction::builder()
            .source(*address)
            .sequence(account.sequence)
            .asset(currency.asset())
            .now_unix(clock.now().timestamp().max(0) as u64)
            .build()
            .into_unsigned()?;

        let signed = signer
            .sign_transaction(&unsigned.to_envelope_xdr()?, network)
            .instrument(spans::sign_transaction(
                &address.to_string(),
                network,
                unsigned.sequence(),
            ))
            .await?;

        ledger
            .submit_transaction(&signed)
            .await?
            .hash
            .ok_or_else(|| BridgeError::SubmissionFailed {
                reason: "no transaction hash returned".to_string(),
            })
    }
}

//! Horizon ledger provider implementation.

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use tracing::{debug, instrument, trace, Instrument};
use url::Url;

use super::rozo::{check_status, endpoint, REQUEST_TIMEOUT};
use crate::error::{BridgeError, Result};
use crate::protocol::{AccountResponse, HorizonProblem, SubmitResponse};
use crate::spans;
use crate::stellar::{StellarAddress, StellarNetwork};
use crate::traits::LedgerProvider;

/// Production ledger provider backed by a Horizon server.
///
/// # Examples
///
/// ```rust,no_run
/// use rozo_bridge::providers::HorizonClient;
/// use rozo_bridge::stellar::{StellarAddress, StellarNetwork};
/// use rozo_bridge::LedgerProvider;
///
/// # async fn example() -> Result<(), rozo_bridge::BridgeError> {
/// let horizon = HorizonClient::for_network(StellarNetwork::Public)?;
/// let account: StellarAddress = "GA5ZSEJYB37JRC5AVCIA5MOP4RHTM335X2KGX3IHOJAPP5RE34K4KZVN".parse()?;
/// let details = horizon.load_account(&account).await?;
/// println!("sequence {}", details.sequence);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HorizonClient {
    base_url: Url,
    network: StellarNetwork,
    client: Client,
}

impl HorizonClient {
    pub fn new(base_url: &str, network: StellarNetwork) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| BridgeError::InvalidUrl {
            reason: format!("{base_url}: {e}"),
        })?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(BridgeError::Network)?;
        Ok(Self {
            base_url,
            network,
            client,
        })
    }

    /// Client for the network's public SDF Horizon instance.
    pub fn for_network(network: StellarNetwork) -> Result<Self> {
        Self::new(network.default_horizon_url(), network)
    }

    pub fn account_url(&self, account: &StellarAddress) -> Result<Url> {
        let account_id = account.base_account().to_string();
        endpoint(&self.base_url, &["accounts", account_id.as_str()])
    }

    pub fn transactions_url(&self) -> Result<Url> {
        endpoint(&self.base_url, &["transactions"])
    }
}

#[async_trait]
impl LedgerProvider for HorizonClient {
    #[instrument(skip(self, account), fields(account = %account))]
    async fn load_account(&self, account: &StellarAddress) -> Result<AccountResponse> {
        let url = self.account_url(account)?;
        trace!(url = %url, "Loading account");

        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(event = "account_not_found");
            return Err(BridgeError::AccountNotFound {
                account: account.base_account().to_string(),
            });
        }
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn submit_transaction(&self, envelope_xdr: &str) -> Result<SubmitResponse> {
        let span = spans::submit_transaction(self.network);
        async {
            let url = self.transactions_url()?;
            let body = format!(
                "tx={}",
                url::form_urlencoded::byte_serialize(envelope_xdr.as_bytes()).collect::<String>()
            );

            let response = self
                .client
                .post(url)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(body)
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::GATEWAY_TIMEOUT {
                return Err(BridgeError::GatewayTimeout);
            }
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                let reason = serde_json::from_str::<HorizonProblem>(&text)
                    .map(|problem| problem.summary())
                    .unwrap_or_else(|_| format!("HTTP {}: {text}", status.as_u16()));
                let err = BridgeError::SubmissionFailed { reason };
                spans::record_error(&err);
                return Err(err);
            }

            let submitted: SubmitResponse = response.json().await?;
            if let Some(hash) = &submitted.hash {
                tracing::Span::current().record("tx_hash", hash.as_str());
                debug!(tx_hash = %hash, event = "transaction_submitted");
            }
            Ok(submitted)
        }
        .instrument(span)
        .await
    }

    fn network(&self) -> StellarNetwork {
        self.network
    }
}

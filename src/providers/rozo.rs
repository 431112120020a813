//! ROZO hosted API client: fee quotes, analytics, rewards and payments.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, trace, Instrument};
use url::Url;

use crate::error::{BridgeError, Result};
use crate::protocol::{
    AnalyticsData, CreatePaymentRequest, FeeLimitError, FeeQuery, FeeQuote, PaymentResponse,
    RewardsData,
};
use crate::spans;
use crate::traits::{AnalyticsProvider, FeeProvider, PaymentProvider, RewardsProvider};

/// Fee quote service.
pub const FEE_API: &str = "https://intentapi.rozo.ai";

/// Payment, analytics and rewards functions.
pub const PAYMENT_API: &str = "https://intentapiv4.rozo.ai/functions/v1";

/// Hosted receipt page; the payment id is appended as `?id=`.
pub const RECEIPT_URL: &str = "https://invoice.rozo.ai/receipt";

/// Timeout applied to every request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Production client for the ROZO intent APIs.
///
/// # Examples
///
/// ```rust,no_run
/// use rozo_bridge::providers::RozoApiClient;
/// use rozo_bridge::protocol::FeeQuery;
/// use rozo_bridge::FeeProvider;
///
/// # async fn example() -> Result<(), rozo_bridge::BridgeError> {
/// let client = RozoApiClient::production()?;
/// let quote = client.get_fee(&FeeQuery::new("100")).await?;
/// println!("fee: {}", quote.fee);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RozoApiClient {
    fee_api: Url,
    payment_api: Url,
    client: Client,
}

impl RozoApiClient {
    /// Creates a client for the given fee and payment API base URLs.
    pub fn new(fee_api: &str, payment_api: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(BridgeError::Network)?;
        Ok(Self {
            fee_api: parse_base_url(fee_api)?,
            payment_api: parse_base_url(payment_api)?,
            client,
        })
    }

    pub fn production() -> Result<Self> {
        Self::new(FEE_API, PAYMENT_API)
    }

    pub fn fee_url(&self, query: &FeeQuery) -> Result<Url> {
        let mut url = endpoint(&self.fee_api, &["getFee"])?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.query_pairs() {
                pairs.append_pair(key, &value);
            }
        }
        Ok(url)
    }

    pub fn analytics_url(&self) -> Result<Url> {
        endpoint(&self.payment_api, &["analytics"])
    }

    pub fn rewards_url(&self, address: &str) -> Result<Url> {
        endpoint(&self.payment_api, &["payment-api", "rewards", address])
    }

    pub fn payments_url(&self) -> Result<Url> {
        endpoint(&self.payment_api, &["payment-api", "payments"])
    }

    pub fn payment_url(&self, payment_id: &str) -> Result<Url> {
        endpoint(&self.payment_api, &["payment-api", "payments", payment_id])
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let span = spans::http_request("GET", &url);
        async {
            let response = self.client.get(url.clone()).send().await?;
            trace!(status_code = %response.status(), "Received response");
            let response = check_status(response).await?;
            Ok(response.json::<T>().await?)
        }
        .instrument(span)
        .await
    }
}

/// Receipt page for a payment.
pub fn receipt_url(payment_id: &str) -> String {
    let mut url = format!("{RECEIPT_URL}?");
    url.push_str(
        &url::form_urlencoded::Serializer::new(String::new())
            .append_pair("id", payment_id)
            .finish(),
    );
    url
}

fn parse_base_url(base: &str) -> Result<Url> {
    let url = Url::parse(base).map_err(|e| BridgeError::InvalidUrl {
        reason: format!("{base}: {e}"),
    })?;
    if url.cannot_be_a_base() {
        return Err(BridgeError::InvalidUrl {
            reason: format!("{base} cannot be used as a base URL"),
        });
    }
    Ok(url)
}

/// Appends path segments to a base URL, keeping any base path.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| BridgeError::InvalidUrl {
            reason: format!("{base} cannot be used as a base URL"),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Maps gateway timeouts and other non-2xx statuses to typed errors.
pub(crate) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status == StatusCode::GATEWAY_TIMEOUT {
        debug!(event = "gateway_timeout");
        return Err(BridgeError::GatewayTimeout);
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), body = %message, event = "api_error");
        return Err(BridgeError::Api {
            status: status.as_u16(),
            message: if message.is_empty() {
                status.canonical_reason().unwrap_or("unknown").to_string()
            } else {
                message
            },
        });
    }
    Ok(response)
}

#[async_trait]
impl FeeProvider for RozoApiClient {
    #[instrument(skip(self), fields(amount = %query.amount, fee_type = %query.fee_type))]
    async fn get_fee(&self, query: &FeeQuery) -> Result<FeeQuote> {
        query.positive_amount()?;
        let url = self.fee_url(query)?;
        trace!(url = %url, "Requesting fee quote");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::GATEWAY_TIMEOUT {
            return Err(BridgeError::GatewayTimeout);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if let Ok(limit) = serde_json::from_str::<FeeLimitError>(&body) {
                debug!(
                    received = limit.received,
                    max_allowed = limit.max_allowed,
                    event = "fee_amount_limit"
                );
                return Err(limit.into());
            }
            return Err(BridgeError::Api {
                status: status.as_u16(),
                message: format!("Failed to fetch fee: {body}"),
            });
        }

        let quote: FeeQuote = response.json().await?;
        debug!(fee = quote.fee, amount_out = quote.amount_out, event = "fee_quoted");
        Ok(quote)
    }
}

#[async_trait]
impl AnalyticsProvider for RozoApiClient {
    #[instrument(skip(self))]
    async fn get_analytics(&self) -> Result<AnalyticsData> {
        self.get_json(self.analytics_url()?).await
    }
}

#[async_trait]
impl RewardsProvider for RozoApiClient {
    #[instrument(skip(self))]
    async fn get_rewards(&self, address: &str) -> Result<RewardsData> {
        if address.trim().is_empty() {
            return Err(BridgeError::InvalidAddress {
                reason: "Address is required".to_string(),
            });
        }
        self.get_json(self.rewards_url(address.trim())?).await
    }
}

#[async_trait]
impl PaymentProvider for RozoApiClient {
    async fn create_payment(&self, request: &CreatePaymentRequest) -> Result<PaymentResponse> {
        let span = spans::create_payment(&request.app_id, request.to_chain, &request.to_units);
        async {
            let url = self.payments_url()?;
            let response = self.client.post(url).json(request).send().await?;
            let response = match check_status(response).await {
                Ok(response) => response,
                Err(e) => {
                    spans::record_error(&e);
                    return Err(e);
                }
            };
            let payment: PaymentResponse = response.json().await?;
            debug!(
                payment_id = payment.id.as_deref().unwrap_or_default(),
                event = "payment_created"
            );
            Ok(payment)
        }
        .instrument(span)
        .await
    }

    #[instrument(skip(self))]
    async fn get_payment(&self, payment_id: &str) -> Result<PaymentResponse> {
        self.get_json(self.payment_url(payment_id)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{FeeCurrency, FeeType, PaymentMetadata, PaymentStatus};
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> RozoApiClient {
        RozoApiClient::new(&server.base_url(), &format!("{}/functions/v1", server.base_url()))
            .unwrap()
    }

    #[test]
    fn test_production_urls() {
        let client = RozoApiClient::production().unwrap();
        let query = FeeQuery::new("10")
            .with_app_id("rozoBridgeStellar")
            .with_currency(FeeCurrency::Usd);
        insta::assert_snapshot!(
            client.fee_url(&query).unwrap(),
            @"https://intentapi.rozo.ai/getFee?amount=10&type=exactOut&appId=rozoBridgeStellar&currency=USD"
        );
        insta::assert_snapshot!(
            client.analytics_url().unwrap(),
            @"https://intentapiv4.rozo.ai/functions/v1/analytics"
        );
        insta::assert_snapshot!(
            client.rewards_url("GABC").unwrap(),
            @"https://intentapiv4.rozo.ai/functions/v1/payment-api/rewards/GABC"
        );
        insta::assert_snapshot!(
            client.payment_url("pay_1").unwrap(),
            @"https://intentapiv4.rozo.ai/functions/v1/payment-api/payments/pay_1"
        );
    }

    #[test]
    fn test_receipt_url() {
        insta::assert_snapshot!(receipt_url("pay 1"), @"https://invoice.rozo.ai/receipt?id=pay+1");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            RozoApiClient::new("not a url", PAYMENT_API),
            Err(BridgeError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_get_fee_success() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/getFee")
                .query_param("amount", "100")
                .query_param("type", "exactIn")
                .query_param("appId", "rozoEURC")
                .query_param("currency", "EUR");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "appId": "rozoEURC",
                    "amount": 100,
                    "currency": "EUR",
                    "fee": 0.2,
                    "feePercentage": "0.2",
                    "minimumFee": "0.1",
                    "amountIn": 100,
                    "amountOut": 99.8
                }));
        });

        let query = FeeQuery::new("100")
            .with_fee_type(FeeType::ExactIn)
            .with_app_id("rozoEURC")
            .with_currency(FeeCurrency::Eur);
        let quote = client(&server).get_fee(&query).await.unwrap();

        assert_eq!(quote.amount_out, 99.8);
        mock.assert();
    }

    #[tokio::test]
    async fn test_get_fee_amount_limit() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/getFee");
            then.status(400)
                .header("content-type", "application/json")
                .json_body(json!({
                    "error": "AMOUNT_TOO_LARGE",
                    "message": "Amount exceeds maximum",
                    "received": 25000,
                    "maxAllowed": 10000
                }));
        });

        let err = client(&server)
            .get_fee(&FeeQuery::new("25000"))
            .await
            .unwrap_err();

        let warning = err.amount_limit_warning().unwrap();
        assert_eq!(warning.received, 25000.0);
        assert_eq!(warning.max_allowed, 10000.0);
    }

    #[tokio::test]
    async fn test_get_fee_rejects_zero_without_request() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/getFee");
            then.status(200);
        });

        let err = client(&server).get_fee(&FeeQuery::new("0")).await.unwrap_err();

        assert!(matches!(err, BridgeError::InvalidAmount { .. }));
        mock.assert_hits(0);
    }

    #[tokio::test]
    async fn test_gateway_timeout_maps_to_dedicated_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/functions/v1/analytics");
            then.status(504);
        });

        let err = client(&server).get_analytics().await.unwrap_err();

        assert!(matches!(err, BridgeError::GatewayTimeout));
        assert_eq!(err.user_message("Analytics"), "Request timeout - please try again");
    }

    #[tokio::test]
    async fn test_create_payment() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/functions/v1/payment-api/payments")
                .json_body_partial(r#"{"appId": "rozoBridgeStellar", "toChain": 8453}"#);
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "id": "pay_42",
                    "status": "payment_unpaid",
                    "source": {
                        "amount": "10.00",
                        "receiverAddress": "GDHU6WRG4IEQXM5NZ4BMPKOXHW76MZM4Y2IEMFDVXBSDP6SJY4ITNPP2",
                        "receiverMemo": "778899"
                    }
                }));
        });

        let request = CreatePaymentRequest::builder()
            .app_id("rozoBridgeStellar")
            .fee_type(FeeType::ExactIn)
            .to_chain(8453)
            .to_token("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913")
            .to_address("0x742d35Cc6634c0532925A3b844Bc9e7595f8fa0d")
            .to_units("10.00")
            .metadata(PaymentMetadata::new("Withdraw", "Transfer USDC from Stellar to Base"))
            .build();
        let payment = client(&server).create_payment(&request).await.unwrap();

        assert_eq!(payment.id.as_deref(), Some("pay_42"));
        assert_eq!(payment.source.receiver_memo.as_deref(), Some("778899"));
        mock.assert();
    }

    #[tokio::test]
    async fn test_get_payment_api_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/functions/v1/payment-api/payments/missing");
            then.status(404).body("payment not found");
        });

        let err = client(&server).get_payment("missing").await.unwrap_err();

        match err {
            BridgeError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "payment not found");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_payment_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/functions/v1/payment-api/payments/pay_42");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "id": "pay_42",
                    "status": "payment_payout_completed",
                    "destination": {"txHash": "0xabc", "chainId": 8453}
                }));
        });

        let payment = client(&server).get_payment("pay_42").await.unwrap();

        assert_eq!(payment.status, Some(PaymentStatus::PaymentPayoutCompleted));
        assert_eq!(payment.destination_tx_hash(), Some("0xabc"));
    }

    #[tokio::test]
    async fn test_get_rewards() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/functions/v1/payment-api/rewards/GABC");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "address": "GABC",
                    "seeds": 5,
                    "totalVolumeUsdc": 10.0,
                    "totalVolumeEurc": 0.0,
                    "transactionUsdcCount": 1,
                    "transactionEurcCount": 0,
                    "lastUpdatedAt": "2025-06-01T00:00:00Z",
                    "createdAt": "2025-06-01T00:00:00Z"
                }));
        });

        let rewards = client(&server).get_rewards("GABC").await.unwrap();
        assert_eq!(rewards.seeds, 5);

        assert!(client(&server).get_rewards("  ").await.is_err());
    }
}

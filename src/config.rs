//! Environment configuration and per-visit app context
//!
//! [`BridgeConfig`] carries the endpoints and storage location, read from
//! the environment (and a `.env` file when present). [`AppContext`] holds
//! what the query string of a visit selects: the currency, the admin app id
//! and a referral code.

use bon::Builder;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::error::{BridgeError, Result};
use crate::history::{FileBackend, HistoryStore, MemoryBackend};
use crate::protocol::{FeeCurrency, FeeQuery, FeeType};
use crate::providers::{HorizonClient, RozoApiClient, FEE_API, PAYMENT_API};
use crate::stellar::StellarNetwork;
use crate::traits::Clock;
use crate::wallet::ActiveCurrency;

/// App id used when nothing else applies.
pub const DEFAULT_APP_ID: &str = "rozoBridgeStellar";

/// App id of the admin view (`?admin=rozo`).
pub const ADMIN_APP_ID: &str = "rozoBridgeStellarAdmin";

/// App id of the EURC view (`?currency=EURC`).
pub const EURC_APP_ID: &str = "rozoEURC";

pub const ENV_APP_ID: &str = "ROZO_APP_ID";
pub const ENV_FEE_API_URL: &str = "ROZO_FEE_API_URL";
pub const ENV_PAYMENT_API_URL: &str = "ROZO_PAYMENT_API_URL";
pub const ENV_HORIZON_URL: &str = "STELLAR_HORIZON_URL";
pub const ENV_NETWORK: &str = "STELLAR_NETWORK";
pub const ENV_HISTORY_PATH: &str = "ROZO_HISTORY_PATH";

/// Endpoints and storage for a bridge deployment
///
/// # Example
///
/// ```rust
/// use rozo_bridge::config::BridgeConfig;
/// use rozo_bridge::stellar::StellarNetwork;
///
/// let config = BridgeConfig::builder()
///     .network(StellarNetwork::Testnet)
///     .build();
/// assert_eq!(config.horizon_url(), "https://horizon-testnet.stellar.org");
/// assert_eq!(config.app_id, "rozoBridgeStellar");
/// ```
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    #[builder(into, default = DEFAULT_APP_ID.to_string())]
    pub app_id: String,
    #[builder(into, default = FEE_API.to_string())]
    pub fee_api_url: String,
    #[builder(into, default = PAYMENT_API.to_string())]
    pub payment_api_url: String,
    #[builder(default = StellarNetwork::Public)]
    pub network: StellarNetwork,
    /// Overrides the network's public Horizon server.
    #[builder(into)]
    pub horizon_url: Option<String>,
    /// Directory for the history files. History is kept in memory when
    /// unset.
    #[builder(into)]
    pub history_path: Option<PathBuf>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl BridgeConfig {
    /// Reads the configuration from the environment after loading `.env`.
    ///
    /// - `ROZO_APP_ID`: default `rozoBridgeStellar`
    /// - `ROZO_FEE_API_URL`, `ROZO_PAYMENT_API_URL`: hosted API defaults
    /// - `STELLAR_NETWORK`: `public` (default) or `testnet`
    /// - `STELLAR_HORIZON_URL`: the network's public Horizon when absent
    /// - `ROZO_HISTORY_PATH`: in-memory history when absent
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), event = "dotenv_loaded");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`BridgeConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let network = match var(ENV_NETWORK) {
            Some(name) => name.parse()?,
            None => StellarNetwork::Public,
        };

        let config = Self::builder()
            .maybe_app_id(var(ENV_APP_ID))
            .maybe_fee_api_url(var(ENV_FEE_API_URL))
            .maybe_payment_api_url(var(ENV_PAYMENT_API_URL))
            .network(network)
            .maybe_horizon_url(var(ENV_HORIZON_URL))
            .maybe_history_path(var(ENV_HISTORY_PATH))
            .build();

        for (name, url) in [
            (ENV_FEE_API_URL, config.fee_api_url.as_str()),
            (ENV_PAYMENT_API_URL, config.payment_api_url.as_str()),
            (ENV_HORIZON_URL, config.horizon_url()),
        ] {
            url::Url::parse(url)
                .map_err(|e| BridgeError::InvalidConfig(format!("{name}: {e}")))?;
        }
        Ok(config)
    }

    pub fn horizon_url(&self) -> &str {
        self.horizon_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_horizon_url())
    }

    pub fn rozo_client(&self) -> Result<RozoApiClient> {
        RozoApiClient::new(&self.fee_api_url, &self.payment_api_url)
    }

    pub fn horizon_client(&self) -> Result<HorizonClient> {
        HorizonClient::new(self.horizon_url(), self.network)
    }

    /// Opens the history store at `history_path`, or an in-memory one.
    pub fn history_store(&self, clock: Arc<dyn Clock>) -> Result<HistoryStore> {
        match &self.history_path {
            Some(path) => Ok(HistoryStore::new(Arc::new(FileBackend::new(path)?), clock)),
            None => Ok(HistoryStore::new(Arc::new(MemoryBackend::new()), clock)),
        }
    }
}

/// What a visit's query string selects
///
/// ```rust
/// use rozo_bridge::config::AppContext;
/// use rozo_bridge::wallet::ActiveCurrency;
///
/// let context = AppContext::from_query("?currency=eurc&ref=ABC123", "rozoBridgeStellar");
/// assert_eq!(context.currency, ActiveCurrency::Eurc);
/// assert_eq!(context.app_id, "rozoEURC");
/// assert_eq!(context.referral.as_deref(), Some("ABC123"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppContext {
    pub currency: ActiveCurrency,
    pub is_admin: bool,
    pub referral: Option<String>,
    pub app_id: String,
}

impl AppContext {
    /// Parses `currency=USDC|EURC`, `admin=rozo` and `ref=<code>`.
    ///
    /// The EURC view uses its own app id, then the admin view, then
    /// `default_app_id`. Unknown parameters and values are ignored.
    pub fn from_query(query: &str, default_app_id: &str) -> Self {
        let mut currency = ActiveCurrency::Usdc;
        let mut is_admin = false;
        let mut referral = None;

        for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            match key.as_ref() {
                "currency" if value.eq_ignore_ascii_case("EURC") => currency = ActiveCurrency::Eurc,
                "currency" if value.eq_ignore_ascii_case("USDC") => currency = ActiveCurrency::Usdc,
                "admin" => is_admin = value == "rozo",
                "ref" if !value.trim().is_empty() => referral = Some(value.trim().to_string()),
                _ => {}
            }
        }

        let app_id = if currency == ActiveCurrency::Eurc {
            EURC_APP_ID
        } else if is_admin {
            ADMIN_APP_ID
        } else {
            default_app_id
        };

        Self {
            currency,
            is_admin,
            referral,
            app_id: app_id.to_string(),
        }
    }

    pub fn fee_currency(&self) -> FeeCurrency {
        FeeCurrency::for_symbol(self.currency.symbol())
    }

    /// Fee lookup for an amount under this context's app id and currency.
    pub fn fee_query(&self, amount: impl Into<String>, fee_type: FeeType) -> FeeQuery {
        FeeQuery::new(amount)
            .with_fee_type(fee_type)
            .with_app_id(self.app_id.as_str())
            .with_currency(self.fee_currency())
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::from_query("", DEFAULT_APP_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    #[rstest]
    #[case("", ActiveCurrency::Usdc, false, "rozoBridgeStellar")]
    #[case("?admin=rozo", ActiveCurrency::Usdc, true, "rozoBridgeStellarAdmin")]
    #[case("?admin=someone", ActiveCurrency::Usdc, false, "rozoBridgeStellar")]
    #[case("currency=EURC", ActiveCurrency::Eurc, false, "rozoEURC")]
    #[case("?currency=EURC&admin=rozo", ActiveCurrency::Eurc, true, "rozoEURC")]
    #[case("?currency=DAI", ActiveCurrency::Usdc, false, "rozoBridgeStellar")]
    fn test_app_context(
        #[case] query: &str,
        #[case] currency: ActiveCurrency,
        #[case] is_admin: bool,
        #[case] app_id: &str,
    ) {
        let context = AppContext::from_query(query, DEFAULT_APP_ID);
        assert_eq!(context.currency, currency);
        assert_eq!(context.is_admin, is_admin);
        assert_eq!(context.app_id, app_id);
    }

    #[test]
    fn test_eurc_fee_query() {
        let query = AppContext::from_query("currency=EURC", DEFAULT_APP_ID)
            .fee_query("100", FeeType::ExactIn);
        assert_eq!(query.currency, Some(FeeCurrency::Eur));
        assert_eq!(query.app_id.as_deref(), Some("rozoEURC"));
    }

    #[test]
    fn test_config_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_APP_ID, "customApp"),
            (ENV_NETWORK, "testnet"),
            (ENV_HISTORY_PATH, "/tmp/rozo"),
            (ENV_PAYMENT_API_URL, "  "),
        ]);
        let config = BridgeConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.app_id, "customApp");
        assert_eq!(config.network, StellarNetwork::Testnet);
        assert_eq!(config.payment_api_url, PAYMENT_API);
        assert_eq!(config.history_path, Some(PathBuf::from("/tmp/rozo")));
        assert_eq!(config.horizon_url(), "https://horizon-testnet.stellar.org");
    }

    #[test]
    fn test_config_rejects_bad_values() {
        let bad_network = BridgeConfig::from_lookup(|key| {
            (key == ENV_NETWORK).then(|| "futurenet".to_string())
        });
        assert!(matches!(bad_network, Err(BridgeError::InvalidConfig(_))));

        let bad_url = BridgeConfig::from_lookup(|key| {
            (key == ENV_FEE_API_URL).then(|| "not a url".to_string())
        });
        assert!(matches!(bad_url, Err(BridgeError::InvalidConfig(_))));
    }

    #[test]
    fn test_history_store_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let config = BridgeConfig::builder().history_path(dir.path()).build();
        let clock: Arc<dyn Clock> = Arc::new(crate::testing::FakeClock::new());

        let store = config.history_store(clock).unwrap();
        assert!(store.get_all().unwrap().is_empty());
    }
}

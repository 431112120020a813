use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Invalid address: {reason}")]
    InvalidAddress { reason: String },

    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    #[error("Invalid memo: {reason}")]
    InvalidMemo { reason: String },

    #[error("Unsupported route: {reason}")]
    UnsupportedRoute { reason: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Gateway timeout")]
    GatewayTimeout,

    #[error("Amount limit exceeded: {message} (received {received}, max {max_allowed})")]
    AmountLimit {
        error: String,
        message: String,
        received: f64,
        max_allowed: f64,
    },

    #[error("Account not found: {account}")]
    AccountNotFound { account: String },

    #[error("No {asset} trustline on {account}")]
    TrustlineMissing { account: String, asset: String },

    #[error("Insufficient XLM balance: {balance}")]
    InsufficientXlm { balance: String },

    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("Wallet {wallet} not found or not installed")]
    WalletNotInstalled { wallet: String },

    #[error("Wallet rejected the request: {reason}")]
    WalletRejected { reason: String },

    #[error("Signing failed: {reason}")]
    SigningFailed { reason: String },

    #[error("Transaction submission failed: {reason}")]
    SubmissionFailed { reason: String },

    #[error("Payment creation failed: {reason}")]
    PaymentCreationFailed { reason: String },

    #[error("Payment {payment_id} failed to settle")]
    SettlementFailed { payment_id: String },

    #[error("Timeout waiting for payment {payment_id} to settle")]
    SettlementTimeout { payment_id: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid URL: {reason}")]
    InvalidUrl { reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XDR error: {0}")]
    Xdr(#[from] stellar_xdr::curr::Error),
}

impl BridgeError {
    /// Short message suitable for a notification line.
    ///
    /// Gateway timeouts and HTTP status failures get a "please try again"
    /// prompt, everything else is prefixed with the operation name.
    pub fn user_message(&self, operation: &str) -> String {
        match self {
            BridgeError::GatewayTimeout => "Request timeout - please try again".to_string(),
            BridgeError::Api { status, .. } => {
                format!("Request failed ({status}) - please try again")
            }
            BridgeError::Network(e) => match e.status() {
                Some(status) if status == reqwest::StatusCode::GATEWAY_TIMEOUT => {
                    "Request timeout - please try again".to_string()
                }
                Some(status) => {
                    format!("Request failed ({}) - please try again", status.as_u16())
                }
                None => format!("{operation} failed: {e}"),
            },
            other => format!("{operation} failed: {other}"),
        }
    }

    /// Whether the error is a validation problem the user fixes inline.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BridgeError::InvalidAddress { .. }
                | BridgeError::InvalidAmount { .. }
                | BridgeError::InvalidMemo { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, warn, Instrument};

use crate::error::{BridgeError, Result};
use crate::spans;
use crate::stellar::StellarAddress;
use crate::traits::WalletConnector;

/// Connection state of the Stellar wallet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WalletState {
    #[default]
    Disconnected,
    Connecting {
        wallet_id: String,
    },
    Connected {
        wallet_id: String,
        address: StellarAddress,
    },
}

impl WalletState {
    pub fn address(&self) -> Option<&StellarAddress> {
        match self {
            Self::Connected { address, .. } => Some(address),
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::Connecting { .. })
    }

    /// What the wallet SDK should display for this state.
    pub fn view(&self) -> ConnectorView {
        match self {
            Self::Connected { wallet_id, address } => ConnectorView {
                connected: true,
                public_key: Some(address.to_string()),
                wallet_id: Some(wallet_id.clone()),
            },
            _ => ConnectorView::default(),
        }
    }
}

/// Connection view exchanged with the wallet SDK
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorView {
    pub connected: bool,
    pub public_key: Option<String>,
    pub wallet_id: Option<String>,
}

/// Single owner of the wallet connection
///
/// The session drives the [`WalletConnector`] and is the only place that
/// decides whether a wallet is connected. After each transition it pushes
/// the derived [`ConnectorView`] to the connector, unless the connector
/// already shows that view. Reports from the connector go through
/// [`WalletSession::observe_external`] and are never pushed back.
pub struct WalletSession {
    connector: Arc<dyn WalletConnector>,
    state: watch::Sender<WalletState>,
    /// Last view the connector is known to show; `None` after a failed push.
    last_view: Mutex<Option<ConnectorView>>,
}

impl WalletSession {
    pub fn new(connector: Arc<dyn WalletConnector>) -> Self {
        let (state, _) = watch::channel(WalletState::Disconnected);
        Self {
            connector,
            state,
            last_view: Mutex::new(Some(ConnectorView::default())),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<WalletState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> WalletState {
        self.state.borrow().clone()
    }

    pub fn address(&self) -> Option<StellarAddress> {
        self.state.borrow().address().copied()
    }

    /// Connected address, or [`BridgeError::WalletNotConnected`].
    pub fn require_address(&self) -> Result<StellarAddress> {
        self.address().ok_or(BridgeError::WalletNotConnected)
    }

    /// Connects to a wallet, prompting the user once.
    ///
    /// Already being connected returns the current address without asking
    /// the wallet again. On failure the session is back to `Disconnected`
    /// and the error is returned as is; nothing is retried.
    pub async fn connect(&self, wallet_id: &str) -> Result<StellarAddress> {
        let span = spans::wallet_connect(wallet_id);
        async {
            let mut current = None;
            self.state.send_if_modified(|state| match state {
                WalletState::Disconnected => {
                    *state = WalletState::Connecting {
                        wallet_id: wallet_id.to_string(),
                    };
                    true
                }
                other => {
                    current = Some(other.clone());
                    false
                }
            });

            match current {
                Some(WalletState::Connected { address, .. }) => return Ok(address),
                Some(WalletState::Connecting { wallet_id }) => {
                    return Err(BridgeError::WalletRejected {
                        reason: format!("connection to {wallet_id} already in progress"),
                    })
                }
                _ => {}
            }

            let connected = self
                .connector
                .connect(wallet_id)
                .await
                .and_then(|address| StellarAddress::parse(&address));

            match connected {
                Ok(address) => {
                    tracing::Span::current().record("address", address.to_string());
                    info!(wallet_id, address = %address, event = "wallet_connected");
                    self.transition(WalletState::Connected {
                        wallet_id: wallet_id.to_string(),
                        address,
                    });
                    self.sync_view().await;
                    Ok(address)
                }
                Err(e) => {
                    spans::record_error(&e);
                    warn!(wallet_id, error = %e, event = "wallet_connect_failed");
                    self.transition(WalletState::Disconnected);
                    self.sync_view().await;
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Disconnects the wallet. The session ends up `Disconnected` even when
    /// the SDK call fails.
    pub async fn disconnect(&self) -> Result<()> {
        let result = self.connector.disconnect().await;
        if let Err(e) = &result {
            warn!(error = %e, event = "wallet_disconnect_failed");
        }
        self.transition(WalletState::Disconnected);
        self.sync_view().await;
        info!(event = "wallet_disconnected");
        result
    }

    /// Applies a state change reported by the wallet SDK.
    ///
    /// The reported view becomes the last known connector view, so nothing
    /// is pushed back.
    pub fn observe_external(&self, view: ConnectorView) {
        let next = match (&view.connected, &view.public_key) {
            (true, Some(key)) => match StellarAddress::parse(key) {
                Ok(address) => WalletState::Connected {
                    wallet_id: view.wallet_id.clone().unwrap_or_default(),
                    address,
                },
                Err(e) => {
                    warn!(error = %e, event = "wallet_external_address_invalid");
                    WalletState::Disconnected
                }
            },
            _ => WalletState::Disconnected,
        };

        *self
            .last_view
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(view);
        debug!(connected = next.is_connected(), event = "wallet_external_update");
        self.transition(next);
    }

    fn transition(&self, next: WalletState) {
        self.state.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            *state = next;
            true
        });
    }

    /// Pushes the current view if the connector does not already show it.
    async fn sync_view(&self) {
        let view = self.state.borrow().view();
        {
            let mut last = self.last_view.lock().unwrap_or_else(PoisonError::into_inner);
            if last.as_ref() == Some(&view) {
                return;
            }
            *last = Some(view.clone());
        }

        if let Err(e) = self.connector.push_view(&view).await {
            warn!(error = %e, event = "wallet_view_push_failed");
            *self
                .last_view
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = None;
        }
    }
}

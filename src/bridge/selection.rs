use crate::chain::{find_token, supported_tokens, ChainId, Token, TokenSymbol, BASE_USDC, STELLAR_USDC};
use crate::validation::is_valid_address;

/// Chains offered in the source and destination pickers, in display order.
///
/// Solana only appears as a withdrawal destination chosen by chain id.
pub const SELECTABLE_CHAINS: [ChainId; 7] = [
    ChainId::Stellar,
    ChainId::Base,
    ChainId::Ethereum,
    ChainId::Polygon,
    ChainId::Arbitrum,
    ChainId::Optimism,
    ChainId::Bsc,
];

/// Source and destination picked for a transfer
///
/// Starts as Base USDC to Stellar USDC. Choosing a chain on one side
/// selects its first token and clears the other side when it is the same
/// chain.
///
/// ```rust
/// use rozo_bridge::bridge::BridgeSelection;
/// use rozo_bridge::ChainId;
///
/// let mut selection = BridgeSelection::default();
/// selection.set_from_chain(ChainId::Stellar);
/// assert_eq!(selection.to_chain(), None);
///
/// selection.set_to_chain(ChainId::Base);
/// assert!(selection.is_complete());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSelection {
    from_chain: Option<ChainId>,
    from_token: Option<Token>,
    to_chain: Option<ChainId>,
    to_token: Option<Token>,
    destination_address: String,
}

impl Default for BridgeSelection {
    fn default() -> Self {
        Self {
            from_chain: Some(ChainId::Base),
            from_token: Some(BASE_USDC),
            to_chain: Some(ChainId::Stellar),
            to_token: Some(STELLAR_USDC),
            destination_address: String::new(),
        }
    }
}

impl BridgeSelection {
    pub fn from_chain(&self) -> Option<ChainId> {
        self.from_chain
    }

    pub fn from_token(&self) -> Option<Token> {
        self.from_token
    }

    pub fn to_chain(&self) -> Option<ChainId> {
        self.to_chain
    }

    pub fn to_token(&self) -> Option<Token> {
        self.to_token
    }

    pub fn destination_address(&self) -> &str {
        &self.destination_address
    }

    pub fn set_from_chain(&mut self, chain: ChainId) {
        self.from_chain = Some(chain);
        self.from_token = supported_tokens(chain).first().copied();
        if self.to_chain == Some(chain) {
            self.to_chain = None;
            self.to_token = None;
        }
    }

    pub fn set_to_chain(&mut self, chain: ChainId) {
        self.to_chain = Some(chain);
        self.to_token = supported_tokens(chain).first().copied();
        if self.from_chain == Some(chain) {
            self.from_chain = None;
            self.from_token = None;
        }
    }

    /// Selects a token on the source chain. Returns `false` if the chain
    /// does not carry it.
    pub fn set_from_token(&mut self, symbol: TokenSymbol) -> bool {
        match self.from_chain.and_then(|chain| find_token(chain, symbol)) {
            Some(token) => {
                self.from_token = Some(token);
                true
            }
            None => false,
        }
    }

    /// Selects a token on the destination chain. Returns `false` if the
    /// chain does not carry it.
    pub fn set_to_token(&mut self, symbol: TokenSymbol) -> bool {
        match self.to_chain.and_then(|chain| find_token(chain, symbol)) {
            Some(token) => {
                self.to_token = Some(token);
                true
            }
            None => false,
        }
    }

    pub fn set_destination_address(&mut self, address: impl Into<String>) {
        self.destination_address = address.into();
    }

    /// Exchanges source and destination. The destination address is
    /// cleared because it belongs to the old destination chain.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.from_chain, &mut self.to_chain);
        std::mem::swap(&mut self.from_token, &mut self.to_token);
        self.destination_address.clear();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Chains selectable as source, excluding the current destination.
    pub fn available_from_chains(&self) -> Vec<ChainId> {
        available_excluding(self.to_chain)
    }

    /// Chains selectable as destination, excluding the current source.
    pub fn available_to_chains(&self) -> Vec<ChainId> {
        available_excluding(self.from_chain)
    }

    pub fn available_from_tokens(&self) -> &'static [Token] {
        self.from_chain.map(supported_tokens).unwrap_or_default()
    }

    pub fn available_to_tokens(&self) -> &'static [Token] {
        self.to_chain.map(supported_tokens).unwrap_or_default()
    }

    /// Whether the destination address is valid for the destination chain.
    pub fn is_destination_address_valid(&self) -> bool {
        match self.to_chain {
            Some(chain) => is_valid_address(self.destination_address.trim(), chain),
            None => false,
        }
    }

    /// Both sides have a chain and a token.
    pub fn is_complete(&self) -> bool {
        self.from_token.is_some() && self.to_token.is_some()
    }

    /// Stellar is the source.
    pub fn is_withdrawal(&self) -> bool {
        self.from_chain == Some(ChainId::Stellar)
    }

    /// Stellar is the destination.
    pub fn is_deposit(&self) -> bool {
        self.to_chain == Some(ChainId::Stellar)
    }
}

fn available_excluding(excluded: Option<ChainId>) -> Vec<ChainId> {
    SELECTABLE_CHAINS
        .into_iter()
        .filter(|chain| Some(*chain) != excluded)
        .collect()
}

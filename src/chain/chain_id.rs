//! Chain identifiers used by the intent payment API
//!
//! EVM chains use their EIP-155 chain id. Non-EVM chains use the ids the
//! payment API assigns them (Solana 900/901, Stellar 1500).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Chain identifier for every network the bridge can route through
///
/// # Example
///
/// ```rust
/// use rozo_bridge::ChainId;
///
/// let base = ChainId::Base;
/// let id: u64 = base.into();
/// assert_eq!(id, 8453);
/// assert!(base.is_evm());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
#[repr(u64)]
pub enum ChainId {
    /// Ethereum mainnet (1)
    Ethereum = 1,
    /// Optimism (10)
    Optimism = 10,
    /// BNB Smart Chain (56)
    Bsc = 56,
    /// Polygon PoS (137)
    Polygon = 137,
    /// Base (8453)
    Base = 8453,
    /// Arbitrum One (42161)
    Arbitrum = 42161,
    /// Polygon Mumbai testnet (80001)
    PolygonMumbai = 80001,
    /// Ethereum Sepolia testnet (11155111)
    Sepolia = 11155111,
    /// Solana mainnet (900)
    Solana = 900,
    /// Solana devnet (901)
    SolanaDevnet = 901,
    /// Stellar public network (1500)
    Stellar = 1500,
}

impl ChainId {
    /// Every chain the payment API accepts as a pay-in chain.
    pub const SUPPORTED: [ChainId; 10] = [
        ChainId::Ethereum,
        ChainId::Base,
        ChainId::Arbitrum,
        ChainId::Optimism,
        ChainId::Polygon,
        ChainId::Bsc,
        ChainId::PolygonMumbai,
        ChainId::Solana,
        ChainId::SolanaDevnet,
        ChainId::Stellar,
    ];

    #[inline]
    pub const fn as_u64(self) -> u64 {
        self as u64
    }

    /// Attempts to create a ChainId from its numeric id
    ///
    /// ```rust
    /// use rozo_bridge::ChainId;
    ///
    /// assert_eq!(ChainId::from_u64(1500), Some(ChainId::Stellar));
    /// assert_eq!(ChainId::from_u64(7), None);
    /// ```
    #[inline]
    pub const fn from_u64(value: u64) -> Option<Self> {
        match value {
            1 => Some(Self::Ethereum),
            10 => Some(Self::Optimism),
            56 => Some(Self::Bsc),
            137 => Some(Self::Polygon),
            8453 => Some(Self::Base),
            42161 => Some(Self::Arbitrum),
            80001 => Some(Self::PolygonMumbai),
            11155111 => Some(Self::Sepolia),
            900 => Some(Self::Solana),
            901 => Some(Self::SolanaDevnet),
            1500 => Some(Self::Stellar),
            _ => None,
        }
    }

    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ethereum => "Ethereum",
            Self::Optimism => "Optimism",
            Self::Bsc => "BNB Smart Chain",
            Self::Polygon => "Polygon",
            Self::Base => "Base",
            Self::Arbitrum => "Arbitrum",
            Self::PolygonMumbai => "Polygon Mumbai",
            Self::Sepolia => "Sepolia",
            Self::Solana => "Solana",
            Self::SolanaDevnet => "Solana Devnet",
            Self::Stellar => "Stellar",
        }
    }

    #[inline]
    pub const fn is_solana(self) -> bool {
        matches!(self, Self::Solana | Self::SolanaDevnet)
    }

    #[inline]
    pub const fn is_stellar(self) -> bool {
        matches!(self, Self::Stellar)
    }

    #[inline]
    pub const fn is_evm(self) -> bool {
        !self.is_solana() && !self.is_stellar()
    }

    #[inline]
    pub const fn is_testnet(self) -> bool {
        matches!(self, Self::PolygonMumbai | Self::Sepolia | Self::SolanaDevnet)
    }

    /// Whether the payment API accepts pay-ins on this chain.
    pub fn is_supported(self) -> bool {
        Self::SUPPORTED.contains(&self)
    }
}

/// Whether a transfer between two chains can be routed.
///
/// Both chains must be supported and distinct.
pub fn is_route_supported(from: ChainId, to: ChainId) -> bool {
    from.is_supported() && to.is_supported() && from != to
}

impl From<ChainId> for u64 {
    #[inline]
    fn from(chain: ChainId) -> Self {
        chain.as_u64()
    }
}

impl TryFrom<u64> for ChainId {
    type Error = InvalidChainId;

    #[inline]
    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::from_u64(value).ok_or(InvalidChainId(value))
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u64())
    }
}

/// Error returned when a numeric id does not name a known chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidChainId(pub u64);

impl fmt::Display for InvalidChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid chain ID: {}", self.0)
    }
}

impl std::error::Error for InvalidChainId {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ChainId::Ethereum, 1)]
    #[case(ChainId::Base, 8453)]
    #[case(ChainId::Polygon, 137)]
    #[case(ChainId::Solana, 900)]
    #[case(ChainId::Stellar, 1500)]
    fn test_chain_id_values(#[case] chain: ChainId, #[case] id: u64) {
        assert_eq!(chain.as_u64(), id);
        assert_eq!(ChainId::try_from(id).unwrap(), chain);
    }

    #[test]
    fn test_invalid_chain_id() {
        assert_eq!(ChainId::try_from(2).unwrap_err(), InvalidChainId(2));
    }

    #[test]
    fn test_chain_families() {
        assert!(ChainId::Base.is_evm());
        assert!(!ChainId::Stellar.is_evm());
        assert!(ChainId::SolanaDevnet.is_solana());
        assert!(ChainId::SolanaDevnet.is_testnet());
        assert!(!ChainId::Solana.is_testnet());
    }

    #[test]
    fn test_route_support() {
        assert!(is_route_supported(ChainId::Base, ChainId::Stellar));
        assert!(!is_route_supported(ChainId::Stellar, ChainId::Stellar));
        // Sepolia has a USDC deployment but is not a pay-in chain
        assert!(!is_route_supported(ChainId::Sepolia, ChainId::Stellar));
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ChainId::Stellar).unwrap();
        assert_eq!(json, "1500");
        let parsed: ChainId = serde_json::from_str("8453").unwrap();
        assert_eq!(parsed, ChainId::Base);
        assert!(serde_json::from_str::<ChainId>("3").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ChainId::Stellar.to_string(), "Stellar (1500)");
    }
}

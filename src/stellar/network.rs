use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use stellar_xdr::curr::Hash;

use crate::error::BridgeError;

/// Stellar networks the bridge can sign for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StellarNetwork {
    #[default]
    Public,
    Testnet,
}

impl StellarNetwork {
    pub const fn passphrase(&self) -> &'static str {
        match self {
            Self::Public => "Public Global Stellar Network ; September 2015",
            Self::Testnet => "Test SDF Network ; September 2015",
        }
    }

    /// SHA-256 of the passphrase, mixed into every signature payload.
    pub fn network_id(&self) -> Hash {
        Hash(Sha256::digest(self.passphrase().as_bytes()).into())
    }

    pub const fn default_horizon_url(&self) -> &'static str {
        match self {
            Self::Public => "https://horizon.stellar.org",
            Self::Testnet => "https://horizon-testnet.stellar.org",
        }
    }

    /// CAIP-2 identifier used by wallet connectors.
    pub const fn caip2(&self) -> &'static str {
        match self {
            Self::Public => "stellar:pubnet",
            Self::Testnet => "stellar:testnet",
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Testnet => "testnet",
        }
    }
}

impl fmt::Display for StellarNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StellarNetwork {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" | "pubnet" | "mainnet" => Ok(Self::Public),
            "testnet" => Ok(Self::Testnet),
            other => Err(BridgeError::InvalidConfig(format!(
                "unknown Stellar network: {other}"
            ))),
        }
    }
}

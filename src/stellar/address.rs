//! Stellar account addresses
//!
//! Accounts are `G...` strkeys (ed25519 public keys). Muxed accounts are
//! `M...` strkeys that carry an extra 64-bit id on top of the base account.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use stellar_strkey::Strkey;
use stellar_xdr::curr::{AccountId, MuxedAccount, MuxedAccountMed25519, PublicKey, Uint256};

use crate::error::{BridgeError, Result};

/// Length of an `M...` muxed account strkey.
pub const MUXED_ADDRESS_LENGTH: usize = 69;

/// Quick shape check for muxed addresses.
///
/// Only the prefix and length are inspected; use [`StellarAddress::parse`]
/// to verify the checksum.
///
/// ```rust
/// use rozo_bridge::stellar::is_muxed_address;
///
/// assert!(is_muxed_address(&format!("M{}", "A".repeat(68))));
/// assert!(!is_muxed_address("GA5ZSEJYB37JRC5AVCIA5MOP4RHTM335X2KGX3IHOJAPP5RE34K4KZVN"));
/// ```
pub fn is_muxed_address(address: &str) -> bool {
    address.starts_with('M') && address.len() == MUXED_ADDRESS_LENGTH
}

/// Whether the string decodes to a Stellar account or muxed account.
pub fn is_valid_stellar_address(address: &str) -> bool {
    StellarAddress::parse(address).is_ok()
}

/// Resolves a muxed address to its base `G...` account.
///
/// Plain accounts are returned unchanged (after trimming).
pub fn normalize_stellar_address(address: &str) -> Result<String> {
    Ok(StellarAddress::parse(address)?.base_account().to_string())
}

/// A decoded Stellar destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StellarAddress {
    /// `G...` ed25519 account
    Account([u8; 32]),
    /// `M...` muxed account
    Muxed { ed25519: [u8; 32], id: u64 },
}

impl StellarAddress {
    /// Decodes and checksums a strkey.
    pub fn parse(address: &str) -> Result<Self> {
        match Strkey::from_string(address.trim()) {
            Ok(Strkey::PublicKeyEd25519(key)) => Ok(Self::Account(key.0)),
            Ok(Strkey::MuxedAccountEd25519(muxed)) => Ok(Self::Muxed {
                ed25519: muxed.ed25519,
                id: muxed.id,
            }),
            Ok(_) => Err(BridgeError::InvalidAddress {
                reason: "not a Stellar account address".to_string(),
            }),
            Err(_) => Err(BridgeError::InvalidAddress {
                reason: "Invalid Stellar address format".to_string(),
            }),
        }
    }

    pub fn is_muxed(&self) -> bool {
        matches!(self, Self::Muxed { .. })
    }

    pub fn muxed_id(&self) -> Option<u64> {
        match self {
            Self::Account(_) => None,
            Self::Muxed { id, .. } => Some(*id),
        }
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        match self {
            Self::Account(key) => *key,
            Self::Muxed { ed25519, .. } => *ed25519,
        }
    }

    /// The `G...` account underneath a muxed address.
    pub fn base_account(&self) -> Self {
        Self::Account(self.public_key_bytes())
    }

    pub fn to_account_id(&self) -> AccountId {
        AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(
            self.public_key_bytes(),
        )))
    }

    pub fn to_muxed_account(&self) -> MuxedAccount {
        match self {
            Self::Account(key) => MuxedAccount::Ed25519(Uint256(*key)),
            Self::Muxed { ed25519, id } => MuxedAccount::MuxedEd25519(MuxedAccountMed25519 {
                id: *id,
                ed25519: Uint256(*ed25519),
            }),
        }
    }
}

impl fmt::Display for StellarAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = match self {
            Self::Account(key) => Strkey::PublicKeyEd25519(stellar_strkey::ed25519::PublicKey(*key)),
            Self::Muxed { ed25519, id } => {
                Strkey::MuxedAccountEd25519(stellar_strkey::ed25519::MuxedAccount {
                    ed25519: *ed25519,
                    id: *id,
                })
            }
        };
        f.write_str(&encoded.to_string())
    }
}

impl FromStr for StellarAddress {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StellarAddress {
    type Error = BridgeError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<StellarAddress> for String {
    fn from(address: StellarAddress) -> Self {
        address.to_string()
    }
}

use std::fmt;
use stellar_xdr::curr::{AlphaNum12, AlphaNum4, Asset, AssetCode12, AssetCode4, ChangeTrustAsset};

use super::address::StellarAddress;
use crate::chain::{TokenSymbol, STELLAR_EURC_ISSUER, STELLAR_USDC_ISSUER};
use crate::error::{BridgeError, Result};

/// Horizon `asset_type` for 1-4 character codes.
pub const ASSET_TYPE_ALPHANUM4: &str = "credit_alphanum4";
/// Horizon `asset_type` for 5-12 character codes.
pub const ASSET_TYPE_ALPHANUM12: &str = "credit_alphanum12";
/// Horizon `asset_type` for lumens.
pub const ASSET_TYPE_NATIVE: &str = "native";

/// A non-native Stellar asset identified by code and issuer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StellarAsset {
    code: String,
    issuer: StellarAddress,
}

impl StellarAsset {
    pub fn new(code: impl Into<String>, issuer: &str) -> Result<Self> {
        let code = code.into();
        if code.is_empty() || code.len() > 12 || !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(BridgeError::InvalidConfig(format!(
                "invalid asset code: {code:?}"
            )));
        }
        let issuer = StellarAddress::parse(issuer)?;
        if issuer.is_muxed() {
            return Err(BridgeError::InvalidAddress {
                reason: "asset issuer cannot be a muxed account".to_string(),
            });
        }
        Ok(Self { code, issuer })
    }

    /// Circle USDC on the public network.
    pub fn usdc() -> Self {
        Self::known("USDC", STELLAR_USDC_ISSUER)
    }

    /// Circle EURC on the public network.
    pub fn eurc() -> Self {
        Self::known("EURC", STELLAR_EURC_ISSUER)
    }

    fn known(code: &str, issuer: &str) -> Self {
        match StellarAddress::parse(issuer) {
            Ok(issuer) => Self {
                code: code.to_string(),
                issuer,
            },
            // The issuer constants are checked by tests
            Err(_) => unreachable!("hard-coded issuer {issuer} must decode"),
        }
    }

    /// The asset that carries a bridge token on Stellar.
    pub fn for_symbol(symbol: TokenSymbol) -> Result<Self> {
        match symbol {
            TokenSymbol::Usdc => Ok(Self::usdc()),
            TokenSymbol::Eurc => Ok(Self::eurc()),
            TokenSymbol::Usdt => Err(BridgeError::UnsupportedRoute {
                reason: "USDT is not issued on Stellar".to_string(),
            }),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn issuer(&self) -> &StellarAddress {
        &self.issuer
    }

    pub fn asset_type(&self) -> &'static str {
        if self.code.len() <= 4 {
            ASSET_TYPE_ALPHANUM4
        } else {
            ASSET_TYPE_ALPHANUM12
        }
    }

    /// Whether a Horizon balance line describes this asset.
    pub fn matches(&self, asset_type: &str, code: Option<&str>, issuer: Option<&str>) -> bool {
        asset_type == self.asset_type()
            && code == Some(self.code.as_str())
            && issuer == Some(self.issuer.to_string().as_str())
    }

    pub fn to_xdr_asset(&self) -> Asset {
        match self.alpha_num() {
            AlphaNum::Four(asset) => Asset::CreditAlphanum4(asset),
            AlphaNum::Twelve(asset) => Asset::CreditAlphanum12(asset),
        }
    }

    pub fn to_change_trust_asset(&self) -> ChangeTrustAsset {
        match self.alpha_num() {
            AlphaNum::Four(asset) => ChangeTrustAsset::CreditAlphanum4(asset),
            AlphaNum::Twelve(asset) => ChangeTrustAsset::CreditAlphanum12(asset),
        }
    }

    fn alpha_num(&self) -> AlphaNum {
        let issuer = self.issuer.to_account_id();
        let bytes = self.code.as_bytes();
        if bytes.len() <= 4 {
            let mut code = [0u8; 4];
            code[..bytes.len()].copy_from_slice(bytes);
            AlphaNum::Four(AlphaNum4 {
                asset_code: AssetCode4(code),
                issuer,
            })
        } else {
            let mut code = [0u8; 12];
            code[..bytes.len()].copy_from_slice(bytes);
            AlphaNum::Twelve(AlphaNum12 {
                asset_code: AssetCode12(code),
                issuer,
            })
        }
    }
}

enum AlphaNum {
    Four(AlphaNum4),
    Twelve(AlphaNum12),
}

impl fmt::Display for StellarAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.code, self.issuer)
    }
}

// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Stablecoin deployments across all supported chains
//!
//! This module centralizes the token addresses the bridge can pay in or pay
//! out, keyed by [`ChainId`].

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ChainId;
use crate::error::{BridgeError, Result};

/// Stablecoin symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenSymbol {
    #[serde(rename = "USDC")]
    Usdc,
    #[serde(rename = "EURC")]
    Eurc,
    #[serde(rename = "USDT")]
    Usdt,
}

impl TokenSymbol {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Usdc => "USDC",
            Self::Eurc => "EURC",
            Self::Usdt => "USDT",
        }
    }

    /// Case-insensitive parse of a symbol.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "USDC" => Some(Self::Usdc),
            "EURC" => Some(Self::Eurc),
            "USDT" => Some(Self::Usdt),
            _ => None,
        }
    }
}

impl fmt::Display for TokenSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A token deployment on a specific chain
///
/// `address` is the EVM contract address, the Solana mint, or the Stellar
/// `CODE:ISSUER` pair depending on the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    pub chain: ChainId,
    pub symbol: TokenSymbol,
    pub address: &'static str,
    pub decimals: u8,
}

// USDC Addresses

/// <https://etherscan.io/token/0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48>
pub const ETHEREUM_USDC_ADDRESS: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");

/// <https://basescan.org/token/0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913>
pub const BASE_USDC_ADDRESS: Address = address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");

/// <https://arbiscan.io/token/0xaf88d065e77c8cC2239327C5EDb3A432268e5831>
pub const ARBITRUM_USDC_ADDRESS: Address = address!("af88d065e77c8cC2239327C5EDb3A432268e5831");

/// <https://optimistic.etherscan.io/token/0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85>
pub const OPTIMISM_USDC_ADDRESS: Address = address!("0b2C639c533813f4Aa9D7837CAf62653d097Ff85");

/// <https://polygonscan.com/token/0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174>
pub const POLYGON_USDC_ADDRESS: Address = address!("2791Bca1f2de4661ED88A30C99A7a9449Aa84174");

/// <https://bscscan.com/token/0x8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d>
pub const BSC_USDC_ADDRESS: Address = address!("8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d");

/// <https://sepolia.etherscan.io/token/0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238>
pub const SEPOLIA_USDC_ADDRESS: Address = address!("1c7D4B196Cb0C7B01d743Fbc6116a902379C7238");

/// <https://mumbai.polygonscan.com/token/0x0FA8781a83E46826621b3BC094Ea2A0212e71B23>
pub const MUMBAI_USDC_ADDRESS: Address = address!("0FA8781a83E46826621b3BC094Ea2A0212e71B23");

// EURC / USDT Addresses

/// <https://etherscan.io/token/0x1aBaEA1f7C830bD89Acc67eC4af516284b1bC33c>
pub const ETHEREUM_EURC_ADDRESS: Address = address!("1aBaEA1f7C830bD89Acc67eC4af516284b1bC33c");

/// <https://basescan.org/token/0x60a3E35Cc302bFA44Cb288Bc5a4F316Fdb1adb42>
pub const BASE_EURC_ADDRESS: Address = address!("60a3E35Cc302bFA44Cb288Bc5a4F316Fdb1adb42");

/// <https://basescan.org/token/0xfde4C96c8593536E31F229EA8f37b2ADa2699bb2>
pub const BASE_USDT_ADDRESS: Address = address!("fde4C96c8593536E31F229EA8f37b2ADa2699bb2");

/// Solana USDC mint
pub const SOLANA_USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

/// Circle's USDC issuer on the Stellar public network
pub const STELLAR_USDC_ISSUER: &str = "GA5ZSEJYB37JRC5AVCIA5MOP4RHTM335X2KGX3IHOJAPP5RE34K4KZVN";

/// Circle's EURC issuer on the Stellar public network
pub const STELLAR_EURC_ISSUER: &str = "GDHU6WRG4IEQXM5NZ4BMPKOXHW76MZM4Y2IEMFDVXBSDP6SJY4ITNPP2";

pub const ETHEREUM_USDC: Token = Token {
    chain: ChainId::Ethereum,
    symbol: TokenSymbol::Usdc,
    address: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
    decimals: 6,
};

pub const ETHEREUM_EURC: Token = Token {
    chain: ChainId::Ethereum,
    symbol: TokenSymbol::Eurc,
    address: "0x1aBaEA1f7C830bD89Acc67eC4af516284b1bC33c",
    decimals: 6,
};

pub const BASE_USDC: Token = Token {
    chain: ChainId::Base,
    symbol: TokenSymbol::Usdc,
    address: "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913",
    decimals: 6,
};

pub const BASE_EURC: Token = Token {
    chain: ChainId::Base,
    symbol: TokenSymbol::Eurc,
    address: "0x60a3E35Cc302bFA44Cb288Bc5a4F316Fdb1adb42",
    decimals: 6,
};

pub const BASE_USDT: Token = Token {
    chain: ChainId::Base,
    symbol: TokenSymbol::Usdt,
    address: "0xfde4C96c8593536E31F229EA8f37b2ADa2699bb2",
    decimals: 6,
};

pub const ARBITRUM_USDC: Token = Token {
    chain: ChainId::Arbitrum,
    symbol: TokenSymbol::Usdc,
    address: "0xaf88d065e77c8cC2239327C5EDb3A432268e5831",
    decimals: 6,
};

pub const OPTIMISM_USDC: Token = Token {
    chain: ChainId::Optimism,
    symbol: TokenSymbol::Usdc,
    address: "0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85",
    decimals: 6,
};

pub const POLYGON_USDC: Token = Token {
    chain: ChainId::Polygon,
    symbol: TokenSymbol::Usdc,
    address: "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174",
    decimals: 6,
};

pub const BSC_USDC: Token = Token {
    chain: ChainId::Bsc,
    symbol: TokenSymbol::Usdc,
    address: "0x8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d",
    decimals: 18,
};

pub const SOLANA_USDC: Token = Token {
    chain: ChainId::Solana,
    symbol: TokenSymbol::Usdc,
    address: SOLANA_USDC_MINT,
    decimals: 6,
};

pub const STELLAR_USDC: Token = Token {
    chain: ChainId::Stellar,
    symbol: TokenSymbol::Usdc,
    address: "USDC:GA5ZSEJYB37JRC5AVCIA5MOP4RHTM335X2KGX3IHOJAPP5RE34K4KZVN",
    decimals: 7,
};

pub const STELLAR_EURC: Token = Token {
    chain: ChainId::Stellar,
    symbol: TokenSymbol::Eurc,
    address: "EURC:GDHU6WRG4IEQXM5NZ4BMPKOXHW76MZM4Y2IEMFDVXBSDP6SJY4ITNPP2",
    decimals: 7,
};

/// Tokens the bridge can move on a chain, in display order.
///
/// The first entry is the default selection for the chain.
pub fn supported_tokens(chain: ChainId) -> &'static [Token] {
    match chain {
        ChainId::Ethereum => &[ETHEREUM_USDC, ETHEREUM_EURC],
        ChainId::Base => &[BASE_USDC, BASE_EURC, BASE_USDT],
        ChainId::Arbitrum => &[ARBITRUM_USDC],
        ChainId::Optimism => &[OPTIMISM_USDC],
        ChainId::Polygon => &[POLYGON_USDC],
        ChainId::Bsc => &[BSC_USDC],
        ChainId::Solana => &[SOLANA_USDC],
        ChainId::Stellar => &[STELLAR_USDC, STELLAR_EURC],
        ChainId::PolygonMumbai | ChainId::Sepolia | ChainId::SolanaDevnet => &[],
    }
}

/// Finds a token by symbol on a chain.
pub fn find_token(chain: ChainId, symbol: TokenSymbol) -> Option<Token> {
    supported_tokens(chain)
        .iter()
        .find(|token| token.symbol == symbol)
        .copied()
}

/// Returns the USDC contract address on an EVM chain
///
/// Solana and Stellar have no EVM address and return an error.
pub fn usdc_address(chain: ChainId) -> Result<Address> {
    match chain {
        ChainId::Ethereum => Ok(ETHEREUM_USDC_ADDRESS),
        ChainId::Base => Ok(BASE_USDC_ADDRESS),
        ChainId::Arbitrum => Ok(ARBITRUM_USDC_ADDRESS),
        ChainId::Optimism => Ok(OPTIMISM_USDC_ADDRESS),
        ChainId::Polygon => Ok(POLYGON_USDC_ADDRESS),
        ChainId::Bsc => Ok(BSC_USDC_ADDRESS),
        ChainId::Sepolia => Ok(SEPOLIA_USDC_ADDRESS),
        ChainId::PolygonMumbai => Ok(MUMBAI_USDC_ADDRESS),
        ChainId::Solana | ChainId::SolanaDevnet | ChainId::Stellar => {
            Err(BridgeError::UnsupportedRoute {
                reason: format!("USDC not supported on EVM chain {chain}"),
            })
        }
    }
}

/// Token a Stellar withdrawal pays out on the destination chain.
///
/// Withdrawals always settle in USDC on Base, Polygon, Ethereum or Solana.
pub fn withdrawal_destination_token(chain: ChainId) -> Result<Token> {
    match chain {
        ChainId::Base => Ok(BASE_USDC),
        ChainId::Polygon => Ok(POLYGON_USDC),
        ChainId::Ethereum => Ok(ETHEREUM_USDC),
        ChainId::Solana => Ok(SOLANA_USDC),
        other => Err(BridgeError::UnsupportedRoute {
            reason: format!("withdrawals to {other} are not supported"),
        }),
    }
}

//! Chain and token configuration for the bridge
//!
//! This module contains the chain identifiers the payment API understands and
//! the stablecoin deployments the bridge can pay in or pay out on each chain.

mod chain_id;
mod tokens;

pub use chain_id::{is_route_supported, ChainId, InvalidChainId};
pub use tokens::*;

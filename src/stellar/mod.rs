//! Stellar ledger primitives
//!
//! Addresses, assets, amounts, memos, network parameters and the two
//! transaction shapes the bridge submits.

mod address;
mod amount;
mod asset;
mod memo;
mod network;
mod transaction;

pub use address::{
    is_muxed_address, is_valid_stellar_address, normalize_stellar_address, StellarAddress,
    MUXED_ADDRESS_LENGTH,
};
pub use amount::{Stroops, STELLAR_DECIMALS, STROOPS_PER_UNIT};
pub use asset::{StellarAsset, ASSET_TYPE_ALPHANUM12, ASSET_TYPE_ALPHANUM4, ASSET_TYPE_NATIVE};
pub use memo::{MemoKind, MemoRequirement, StellarMemo, MAX_TEXT_MEMO_BYTES, MEMO_REQUIRED_DATA_KEY};
pub use network::StellarNetwork;
pub use transaction::{
    attach_signature, decode_envelope, encode_envelope, envelope_hash, signature_count,
    signature_payload_hash, ChangeTrustTransaction, PaymentTransaction, UnsignedTransaction,
    BASE_FEE, CHANGE_TRUST_TIMEOUT_SECS, MAX_TRUST_LIMIT, PAYMENT_TIMEOUT_SECS,
};

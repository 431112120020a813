//! Transfer history
//!
//! A flat JSON list of [`BridgeHistoryItem`]s keyed by payment id, persisted
//! through a [`HistoryBackend`] and guarded by [`HistoryStore`].

mod backend;
mod item;
mod legacy;
mod store;

pub use backend::{FileBackend, HistoryBackend, MemoryBackend};
pub use item::{BridgeHistoryItem, HistoryStatus, NewHistoryEntry, GUEST_WALLET};
pub use legacy::{
    chain_from_legacy_name, LegacyHistory, LegacyStellarHistoryItem, LegacyTransferType,
    LEGACY_STORAGE_KEY,
};
pub use store::{HistoryEvent, HistoryStore, HISTORY_STORAGE_KEY, PENDING_EXPIRATION};

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::backend::{HistoryBackend, MemoryBackend};
use super::item::{BridgeHistoryItem, HistoryStatus, NewHistoryEntry};
use super::legacy::{LegacyStellarHistoryItem, RawLegacyHistory, LEGACY_STORAGE_KEY};
use crate::error::Result;
use crate::traits::Clock;

/// Storage key of the flat history list.
pub const HISTORY_STORAGE_KEY: &str = "rozo_bridge_history_v2";

/// Pending transfers older than this are relabeled `expired`.
pub const PENDING_EXPIRATION: Duration = Duration::from_secs(60 * 60);

const EVENT_CAPACITY: usize = 64;

/// Change notifications published by [`HistoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEvent {
    /// A transfer was added or merged into an existing one.
    Saved(BridgeHistoryItem),
    StatusUpdated(BridgeHistoryItem),
    Expired { payment_ids: Vec<String> },
    WalletCleared { wallet_address: Option<String> },
    Cleared,
    Migrated { imported: usize },
}

/// Persistent list of bridge transfers
///
/// Every operation is a read-modify-write of one JSON document, serialized
/// by an internal lock. Reads relabel stale pending transfers as expired and
/// persist the result.
///
/// # Example
///
/// ```rust
/// use rozo_bridge::history::{HistoryStore, NewHistoryEntry};
/// use rozo_bridge::providers::TokioClock;
/// use rozo_bridge::chain::{ChainId, TokenSymbol};
/// use std::sync::Arc;
///
/// # fn main() -> Result<(), rozo_bridge::BridgeError> {
/// let store = HistoryStore::in_memory(Arc::new(TokioClock));
/// store.save(
///     NewHistoryEntry::builder()
///         .payment_id("pay_1")
///         .amount("10")
///         .source_chain(ChainId::Stellar)
///         .source_token(TokenSymbol::Usdc)
///         .destination_chain(ChainId::Base)
///         .destination_token(TokenSymbol::Usdc)
///         .destination_address("0x742d35Cc6634c0532925A3b844Bc9e7595f8fa0d")
///         .build(),
/// )?;
/// assert_eq!(store.for_wallet(None)?.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct HistoryStore {
    backend: Arc<dyn HistoryBackend>,
    clock: Arc<dyn Clock>,
    lock: Mutex<()>,
    events: broadcast::Sender<HistoryEvent>,
}

impl HistoryStore {
    pub fn new(backend: Arc<dyn HistoryBackend>, clock: Arc<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            backend,
            clock,
            lock: Mutex::new(()),
            events,
        }
    }

    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self::new(Arc::new(MemoryBackend::new()), clock)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HistoryEvent> {
        self.events.subscribe()
    }

    /// Records a transfer, merging into the stored item with the same
    /// payment id if there is one.
    pub fn save(&self, entry: NewHistoryEntry) -> Result<BridgeHistoryItem> {
        let _guard = self.guard();
        let now = self.clock.now();
        let mut items = self.load_items(now)?;

        let saved = match items.iter_mut().find(|i| i.payment_id == entry.payment_id) {
            Some(existing) => {
                entry.merge_into(existing, now);
                debug!(payment_id = %existing.payment_id, status = %existing.status, event = "history_merged");
                existing.clone()
            }
            None => {
                let item = entry.into_item(now);
                debug!(payment_id = %item.payment_id, status = %item.status, event = "history_saved");
                items.insert(0, item.clone());
                item
            }
        };

        self.persist(&items)?;
        self.publish(HistoryEvent::Saved(saved.clone()));
        Ok(saved)
    }

    /// All transfers, newest first.
    pub fn get_all(&self) -> Result<Vec<BridgeHistoryItem>> {
        let _guard = self.guard();
        let mut items = self.load_items(self.clock.now())?;
        sort_newest_first(&mut items);
        Ok(items)
    }

    /// Transfers recorded for a wallet, newest first. `None` selects guest
    /// transfers.
    pub fn for_wallet(&self, wallet_address: Option<&str>) -> Result<Vec<BridgeHistoryItem>> {
        let mut items = self.get_all()?;
        items.retain(|item| item.belongs_to(wallet_address));
        Ok(items)
    }

    pub fn find(&self, payment_id: &str) -> Result<Option<BridgeHistoryItem>> {
        Ok(self
            .get_all()?
            .into_iter()
            .find(|item| item.payment_id == payment_id))
    }

    /// Removes every transfer recorded for a wallet.
    pub fn clear_wallet(&self, wallet_address: Option<&str>) -> Result<()> {
        let _guard = self.guard();
        let mut items = self.load_items(self.clock.now())?;
        items.retain(|item| !item.belongs_to(wallet_address));
        self.persist(&items)?;
        self.publish(HistoryEvent::WalletCleared {
            wallet_address: wallet_address.map(str::to_string),
        });
        Ok(())
    }

    pub fn clear_all(&self) -> Result<()> {
        let _guard = self.guard();
        self.persist(&[])?;
        self.publish(HistoryEvent::Cleared);
        Ok(())
    }

    /// Sets the status of a stored transfer. Unknown payment ids are ignored
    /// and return `None`.
    pub fn update_status(
        &self,
        payment_id: &str,
        status: HistoryStatus,
        destination_tx_hash: Option<&str>,
    ) -> Result<Option<BridgeHistoryItem>> {
        let _guard = self.guard();
        let mut items = self.load_items(self.clock.now())?;

        let Some(item) = items.iter_mut().find(|i| i.payment_id == payment_id) else {
            debug!(payment_id, event = "history_update_missing");
            return Ok(None);
        };
        item.status = status;
        if let Some(hash) = destination_tx_hash.filter(|h| !h.is_empty()) {
            item.destination_tx_hash = Some(hash.to_string());
        }
        let updated = item.clone();

        self.persist(&items)?;
        self.publish(HistoryEvent::StatusUpdated(updated.clone()));
        Ok(Some(updated))
    }

    /// Imports the per-wallet format into the flat list and removes it.
    ///
    /// Payment ids already present and entries that fail to decode are
    /// skipped. A document that does not parse at all is left in place.
    /// Returns the number of imported transfers.
    pub fn migrate_legacy(&self) -> Result<usize> {
        let _guard = self.guard();
        let Some(raw) = self.backend.load(LEGACY_STORAGE_KEY)? else {
            return Ok(0);
        };

        let legacy: RawLegacyHistory = match serde_json::from_str(&raw) {
            Ok(legacy) => legacy,
            Err(e) => {
                warn!(error = %e, event = "legacy_history_unreadable");
                return Ok(0);
            }
        };

        let mut items = self.load_items(self.clock.now())?;
        let mut seen: HashSet<String> = items.iter().map(|i| i.payment_id.clone()).collect();
        let mut imported = 0;

        for (wallet, entries) in legacy {
            for entry in entries {
                let legacy_item = match serde_json::from_value::<LegacyStellarHistoryItem>(entry) {
                    Ok(item) => item,
                    Err(e) => {
                        warn!(wallet = %wallet, error = %e, event = "legacy_history_item_unreadable");
                        continue;
                    }
                };
                let Some(item) = legacy_item.into_item() else {
                    continue;
                };
                if seen.insert(item.payment_id.clone()) {
                    items.push(item);
                    imported += 1;
                }
            }
        }

        if imported > 0 {
            sort_newest_first(&mut items);
            self.persist(&items)?;
        }
        self.backend.remove(LEGACY_STORAGE_KEY)?;

        info!(imported, event = "legacy_history_migrated");
        self.publish(HistoryEvent::Migrated { imported });
        Ok(imported)
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reads the list and expires stale pending transfers. An unreadable
    /// document reads as empty.
    fn load_items(&self, now: DateTime<Utc>) -> Result<Vec<BridgeHistoryItem>> {
        let Some(raw) = self.backend.load(HISTORY_STORAGE_KEY)? else {
            return Ok(Vec::new());
        };
        let mut items: Vec<BridgeHistoryItem> = match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, event = "history_unreadable");
                return Ok(Vec::new());
            }
        };

        let expired = expire_pending(&mut items, now);
        if !expired.is_empty() {
            // A failed write still returns the relabeled list.
            if let Err(e) = self.persist(&items) {
                warn!(error = %e, event = "history_expiry_not_persisted");
            }
            info!(count = expired.len(), event = "history_expired");
            self.publish(HistoryEvent::Expired {
                payment_ids: expired,
            });
        }
        Ok(items)
    }

    fn persist(&self, items: &[BridgeHistoryItem]) -> Result<()> {
        let json = serde_json::to_string(items)?;
        self.backend.store(HISTORY_STORAGE_KEY, &json)
    }

    fn publish(&self, event: HistoryEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

fn expire_pending(items: &mut [BridgeHistoryItem], now: DateTime<Utc>) -> Vec<String> {
    items
        .iter_mut()
        .filter(|item| item.status == HistoryStatus::Pending)
        .filter(|item| match now.signed_duration_since(item.completed_at).to_std() {
            Ok(age) => age > PENDING_EXPIRATION,
            Err(_) => false,
        })
        .map(|item| {
            item.status = HistoryStatus::Expired;
            item.payment_id.clone()
        })
        .collect()
}

fn sort_newest_first(items: &mut [BridgeHistoryItem]) {
    items.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ChainId, TokenSymbol};
    use crate::testing::FakeClock;

    fn entry(payment_id: &str, wallet: Option<&str>, status: HistoryStatus) -> NewHistoryEntry {
        NewHistoryEntry::builder()
            .maybe_wallet_address(wallet.map(str::to_string))
            .payment_id(payment_id)
            .amount("10")
            .source_chain(ChainId::Stellar)
            .source_token(TokenSymbol::Usdc)
            .destination_chain(ChainId::Base)
            .destination_token(TokenSymbol::Usdc)
            .destination_address("0xabc")
            .status(status)
            .build()
    }

    fn store_with_legacy(document: &str) -> (HistoryStore, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        backend.store(LEGACY_STORAGE_KEY, document).unwrap();
        let store = HistoryStore::new(backend.clone(), Arc::new(FakeClock::new()));
        (store, backend)
    }

    fn legacy_entry(payment_id: &str, completed_at: &str) -> serde_json::Value {
        serde_json::json!({
            "id": payment_id,
            "paymentId": payment_id,
            "amount": "5",
            "destinationAddress": "0xabc",
            "type": "withdraw",
            "fromChain": "Stellar",
            "toChain": "Base",
            "completedAt": completed_at,
            "walletAddress": "GA5ZSEJYB37JRC5AVCIA5MOP4RHTM335X2KGX3IHOJAPP5RE34K4KZVN"
        })
    }

    fn store() -> (HistoryStore, FakeClock) {
        let clock = FakeClock::new();
        (HistoryStore::in_memory(Arc::new(clock.clone())), clock)
    }

    #[test]
    fn test_save_prepends_and_sorts_newest_first() {
        let (store, clock) = store();
        store.save(entry("a", None, HistoryStatus::Completed)).unwrap();
        clock.advance(Duration::from_secs(5));
        store.save(entry("b", None, HistoryStatus::Completed)).unwrap();

        let ids: Vec<_> = store
            .get_all()
            .unwrap()
            .into_iter()
            .map(|i| i.payment_id)
            .collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn test_save_same_payment_merges() {
        let (store, _clock) = store();
        store.save(entry("a", Some("GW"), HistoryStatus::Pending)).unwrap();
        let merged = store
            .save(NewHistoryEntry {
                destination_tx_hash: Some("0xdest".to_string()),
                ..entry("a", Some("GW"), HistoryStatus::Completed)
            })
            .unwrap();

        assert_eq!(store.get_all().unwrap().len(), 1);
        assert_eq!(merged.status, HistoryStatus::Completed);
        assert_eq!(merged.destination_tx_hash.as_deref(), Some("0xdest"));
    }

    #[test]
    fn test_pending_expires_after_one_hour() {
        let (store, clock) = store();
        let mut events = store.subscribe();
        store.save(entry("a", None, HistoryStatus::Pending)).unwrap();

        clock.advance(PENDING_EXPIRATION);
        assert_eq!(store.get_all().unwrap()[0].status, HistoryStatus::Pending);

        clock.advance(Duration::from_secs(1));
        assert_eq!(store.get_all().unwrap()[0].status, HistoryStatus::Expired);

        assert!(matches!(events.try_recv(), Ok(HistoryEvent::Saved(_))));
        assert_eq!(
            events.try_recv().unwrap(),
            HistoryEvent::Expired {
                payment_ids: vec!["a".to_string()]
            }
        );
        // Persisted, so the next read publishes nothing new.
        store.get_all().unwrap();
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_completed_items_never_expire() {
        let (store, clock) = store();
        store.save(entry("a", None, HistoryStatus::Completed)).unwrap();
        clock.advance(Duration::from_secs(10 * 3600));
        assert_eq!(store.get_all().unwrap()[0].status, HistoryStatus::Completed);
    }

    #[test]
    fn test_wallet_filter_and_clear() {
        let (store, _clock) = store();
        store.save(entry("a", Some("GW1"), HistoryStatus::Completed)).unwrap();
        store.save(entry("b", Some("GW2"), HistoryStatus::Completed)).unwrap();
        store.save(entry("c", None, HistoryStatus::Completed)).unwrap();

        assert_eq!(store.for_wallet(Some("GW1")).unwrap().len(), 1);
        assert_eq!(store.for_wallet(None).unwrap()[0].payment_id, "c");

        store.clear_wallet(Some("GW1")).unwrap();
        assert!(store.for_wallet(Some("GW1")).unwrap().is_empty());
        assert_eq!(store.get_all().unwrap().len(), 2);

        store.clear_all().unwrap();
        assert!(store.get_all().unwrap().is_empty());
    }

    #[test]
    fn test_update_status_missing_is_noop() {
        let (store, _clock) = store();
        let mut events = store.subscribe();
        assert_eq!(
            store
                .update_status("nope", HistoryStatus::Failed, None)
                .unwrap(),
            None
        );
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_update_status_sets_destination_hash() {
        let (store, _clock) = store();
        store.save(entry("a", None, HistoryStatus::Pending)).unwrap();
        let updated = store
            .update_status("a", HistoryStatus::Completed, Some("0xfeed"))
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, HistoryStatus::Completed);
        assert_eq!(updated.destination_tx_hash.as_deref(), Some("0xfeed"));
    }

    #[test]
    fn test_unreadable_document_reads_empty() {
        let backend = Arc::new(MemoryBackend::new());
        backend.store(HISTORY_STORAGE_KEY, "not json").unwrap();
        let store = HistoryStore::new(backend, Arc::new(FakeClock::new()));
        assert!(store.get_all().unwrap().is_empty());
    }

    #[test]
    fn test_migration_skips_malformed_entries() {
        let document = serde_json::json!({
            "GA5ZSEJYB37JRC5AVCIA5MOP4RHTM335X2KGX3IHOJAPP5RE34K4KZVN": [
                legacy_entry("pay_good", "2024-11-02T10:00:00Z"),
                legacy_entry("pay_bad", "not-a-date"),
            ]
        });
        let (store, backend) = store_with_legacy(&document.to_string());

        assert_eq!(store.migrate_legacy().unwrap(), 1);

        let items = store.get_all().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].payment_id, "pay_good");
        assert_eq!(backend.load(LEGACY_STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn test_unreadable_legacy_document_is_kept() {
        let (store, backend) = store_with_legacy("{not json");

        assert_eq!(store.migrate_legacy().unwrap(), 0);

        assert!(store.get_all().unwrap().is_empty());
        assert_eq!(
            backend.load(LEGACY_STORAGE_KEY).unwrap().as_deref(),
            Some("{not json")
        );
    }
}

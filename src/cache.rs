//! Time-bounded query cache and the quote service built on it.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, Instrument};

use crate::error::Result;
use crate::protocol::{AnalyticsData, FeeQuery, FeeQuote, RewardsData};
use crate::spans;
use crate::traits::{AnalyticsProvider, Clock, FeeProvider, RewardsProvider};

/// Fee quotes stay fresh for 30 seconds.
pub const FEE_STALE_TIME: Duration = Duration::from_secs(30);

/// Analytics stay fresh for one minute.
pub const ANALYTICS_STALE_TIME: Duration = Duration::from_secs(60);

/// Rewards stay fresh for one minute.
pub const REWARDS_STALE_TIME: Duration = Duration::from_secs(60);

/// Key-value cache whose entries go stale after a fixed time
///
/// Only successful results are stored; failures are never cached so the next
/// read goes back to the source.
pub struct QueryCache<K, V> {
    stale_time: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<K, (DateTime<Utc>, V)>>,
}

impl<K: Eq + Hash, V: Clone> QueryCache<K, V> {
    pub fn new(stale_time: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            stale_time,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached value if it is still fresh.
    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let (stored_at, value) = entries.get(key)?;
        let age = self.clock.now().signed_duration_since(*stored_at);
        match age.to_std() {
            Ok(age) if age >= self.stale_time => None,
            _ => Some(value.clone()),
        }
    }

    pub fn insert(&self, key: K, value: V) {
        let now = self.clock.now();
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, (now, value));
    }

    pub fn invalidate(&self, key: &K) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cached access to fee quotes, analytics and rewards
///
/// Completed transfers call [`QuoteService::invalidate_analytics`] so the
/// next analytics read reflects them.
pub struct QuoteService {
    fee: Arc<dyn FeeProvider>,
    analytics: Arc<dyn AnalyticsProvider>,
    rewards: Arc<dyn RewardsProvider>,
    fee_cache: QueryCache<FeeQuery, FeeQuote>,
    analytics_cache: QueryCache<(), AnalyticsData>,
    rewards_cache: QueryCache<String, RewardsData>,
}

impl QuoteService {
    pub fn new(
        fee: Arc<dyn FeeProvider>,
        analytics: Arc<dyn AnalyticsProvider>,
        rewards: Arc<dyn RewardsProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            fee,
            analytics,
            rewards,
            fee_cache: QueryCache::new(FEE_STALE_TIME, clock.clone()),
            analytics_cache: QueryCache::new(ANALYTICS_STALE_TIME, clock.clone()),
            rewards_cache: QueryCache::new(REWARDS_STALE_TIME, clock),
        }
    }

    /// Builds the service around one client that serves all three endpoints.
    pub fn from_client<C>(client: Arc<C>, clock: Arc<dyn Clock>) -> Self
    where
        C: FeeProvider + AnalyticsProvider + RewardsProvider + 'static,
    {
        Self::new(client.clone(), client.clone(), client, clock)
    }

    pub async fn get_fee(&self, query: &FeeQuery) -> Result<FeeQuote> {
        let cached = self.fee_cache.get(query);
        let span = spans::get_fee(&query.amount, query.fee_type.as_str(), cached.is_some());
        async {
            if let Some(quote) = cached {
                return Ok(quote);
            }
            let quote = self.fee.get_fee(query).await?;
            self.fee_cache.insert(query.clone(), quote.clone());
            Ok(quote)
        }
        .instrument(span)
        .await
    }

    pub async fn get_analytics(&self) -> Result<AnalyticsData> {
        if let Some(data) = self.analytics_cache.get(&()) {
            return Ok(data);
        }
        let data = self.analytics.get_analytics().await?;
        self.analytics_cache.insert((), data.clone());
        Ok(data)
    }

    pub async fn get_rewards(&self, address: &str) -> Result<RewardsData> {
        let key = address.trim().to_string();
        if let Some(data) = self.rewards_cache.get(&key) {
            return Ok(data);
        }
        let data = self.rewards.get_rewards(&key).await?;
        self.rewards_cache.insert(key, data.clone());
        Ok(data)
    }

    pub fn invalidate_analytics(&self) {
        debug!(event = "analytics_invalidated");
        self.analytics_cache.clear();
    }

    pub fn invalidate_rewards(&self, address: &str) {
        self.rewards_cache.invalidate(&address.trim().to_string());
    }
}

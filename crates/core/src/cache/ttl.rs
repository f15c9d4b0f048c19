use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::clock::{Clock, SystemClock};

/// A cached value with the instant it was stored.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.inserted_at) > ttl
    }
}

/// Point-in-time counters for one cache instance.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    pub name: String,
    pub ttl_secs: u64,
    pub total_entries: usize,
    pub expired_entries: usize,
}

/// Keyed store where every entry expires a fixed duration after insertion.
///
/// Backed by a sharded concurrent map, so reads and writes from concurrent
/// requests only contend on the shard holding the key. Expired entries are
/// dropped lazily on read and in bulk by [`TtlCache::sweep`].
#[derive(Debug)]
pub struct TtlCache<V> {
    name: &'static str,
    ttl: Duration,
    entries: DashMap<String, CacheEntry<V>>,
    clock: Arc<dyn Clock>,
}

impl<V: Clone + Send + Sync> TtlCache<V> {
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self::with_clock(name, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(name: &'static str, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            ttl,
            entries: DashMap::new(),
            clock,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the value if present and not expired; evicts it if expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        {
            let entry = self.entries.get(key)?;
            if !entry.is_expired(now, self.ttl) {
                debug!(cache = self.name, key = %key, "Cache hit");
                return Some(entry.value.clone());
            }
        }
        // The read guard is released above; remove_if re-checks under the
        // write lock in case a fresh value was stored in between.
        self.entries
            .remove_if(key, |_, entry| entry.is_expired(now, self.ttl));
        debug!(cache = self.name, key = %key, "Cache entry expired");
        None
    }

    /// Store a value, replacing any previous entry and restarting its TTL.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let entry = CacheEntry {
            value,
            inserted_at: self.clock.now(),
        };
        self.entries.insert(key.into(), entry);
    }

    /// Evict every expired entry. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| !entry.is_expired(now, self.ttl));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let expired_entries = self
            .entries
            .iter()
            .filter(|entry| entry.value().is_expired(now, self.ttl))
            .count();
        CacheStats {
            name: self.name.to_string(),
            ttl_secs: self.ttl.as_secs(),
            total_entries: self.entries.len(),
            expired_entries,
        }
    }
}

use std::hash::Hash;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use log::debug;

use super::clock::{Clock, SystemClock};

struct Entry<V> {
    value: V,
    inserted_at: DateTime<Utc>,
}

/// Concurrent map whose entries expire `ttl` after insertion.
///
/// Expired entries are dropped lazily on lookup. There is no per-key
/// invalidation; [`clear`](Self::clear) empties everything.
pub struct TtlCache<K, V> {
    name: &'static str,
    entries: DashMap<K, Entry<V>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self::with_clock(name, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(name: &'static str, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value for `key`, if any.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        if let Some(entry) = self.entries.get(key) {
            if now - entry.inserted_at < self.ttl {
                return Some(entry.value.clone());
            }
        }
        self.evict_expired(key, now);
        None
    }

    /// Remove `key` only if it is still expired at `now`.
    ///
    /// Re-checked under the write lock: a concurrent insert may have
    /// replaced the entry since it was read.
    fn evict_expired(&self, key: &K, now: DateTime<Utc>) {
        self.entries
            .remove_if(key, |_, entry| now - entry.inserted_at >= self.ttl);
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(
            key,
            Entry {
                value,
                inserted_at: self.clock.now(),
            },
        );
    }

    pub fn clear(&self) {
        debug!("Clearing {} cache ({} entries)", self.name, self.entries.len());
        self.entries.clear();
    }

    /// Number of stored entries, expired ones included until next touched.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

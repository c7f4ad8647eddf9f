// src/services/cache.rs

//! In-memory cache with per-entry insertion times.
//!
//! Entries carry the time they were last written. Readers either take any
//! entry or only one younger than a maximum age; stale entries are dropped
//! explicitly with [`TimedCache::evict_older_than`].

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::utils::Clock;

struct Entry<V> {
    stored_at: DateTime<Utc>,
    value: V,
}

/// Keyed values stamped with the injected clock.
pub struct TimedCache<K, V> {
    clock: Arc<dyn Clock>,
    entries: BTreeMap<K, Entry<V>>,
}

impl<K: Ord, V> TimedCache<K, V> {
    /// Create an empty cache.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: BTreeMap::new(),
        }
    }

    /// Store a value, refreshing its timestamp. Returns the previous value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let entry = Entry {
            stored_at: self.clock.now(),
            value,
        };
        self.entries.insert(key, entry).map(|old| old.value)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|entry| &entry.value)
    }

    /// The value if it was stored less than `max_age` ago.
    pub fn get_fresh(&self, key: &K, max_age: Duration) -> Option<&V> {
        let now = self.clock.now();
        self.entries
            .get(key)
            .filter(|entry| now - entry.stored_at < max_age)
            .map(|entry| &entry.value)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|entry| entry.value)
    }

    /// Drop entries stored `max_age` or longer ago. Returns how many were dropped.
    pub fn evict_older_than(&mut self, max_age: Duration) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now - entry.stored_at < max_age);
        before - self.entries.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

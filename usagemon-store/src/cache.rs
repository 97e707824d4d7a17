//! In-memory TTL cache.
//!
//! Entries expire `ttl` after they were stored. Expired entries are evicted
//! lazily by [`TtlCache::get`] or eagerly by [`TtlCache::prune`]. Time comes
//! from the tokio clock, so paused-time tests can advance past the TTL.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Default time-to-live.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// One cached value.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// Cached value.
    pub data: T,
    /// When the value was stored.
    pub stored_at: Instant,
    /// When the value stops being served.
    pub expires_at: Instant,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

/// Key/value cache with a single TTL for every entry.
#[derive(Debug)]
pub struct TtlCache<T> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
    ttl: Duration,
}

impl<T: Clone> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<T: Clone> TtlCache<T> {
    /// Creates an empty cache.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the value for `key` if it has not expired; evicts it otherwise.
    pub fn get(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                debug!(key, "Cache entry expired");
                None
            }
            Some(entry) => Some(entry.data.clone()),
            None => None,
        }
    }

    /// Stores `value` under `key`, replacing any previous entry.
    pub fn set(&self, key: impl Into<String>, value: T) {
        let now = Instant::now();
        let entry = CacheEntry {
            data: value,
            stored_at: now,
            expires_at: now + self.ttl,
        };
        self.lock().insert(key.into(), entry);
    }

    /// Returns true if `key` holds an unexpired value.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Removes `key`; returns whether it was present.
    pub fn delete(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Removes every expired entry and returns how many were removed.
    pub fn prune(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, "Pruned cache");
        }
        removed
    }

    /// Number of stored entries, expired ones included until pruned.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

//! Time-bounded result cache.
//!
//! [`TtlCache`] keeps at most `capacity` entries in an [`LruCache`], each for
//! at most `ttl`. Time comes from a [`Clock`], so tests drive expiry with a
//! [`ManualClock`] instead of sleeping.

use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use lru::LruCache;

use crate::config::MAX_CACHE_TTL_SECS;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Create a clock stopped at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Move the clock forward. Saturates instead of overflowing.
    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(next) = now.checked_add_signed(by) {
            *now = next;
        }
    }

    /// Jump to an absolute instant.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone)]
struct Entry<V> {
    inserted_at: DateTime<Utc>,
    value: V,
}

/// A bounded map whose entries expire.
///
/// An entry is served while its age is at most the TTL. The TTL is clamped to
/// 1 second ..= 1 hour and the capacity to at least 1. When full, inserting a
/// new key evicts the least recently used entry.
pub struct TtlCache<K, V, C = SystemClock> {
    entries: LruCache<K, Entry<V>>,
    ttl: Duration,
    clock: C,
}

impl<K: Eq + Hash, V, C: fmt::Debug> fmt::Debug for TtlCache<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("len", &self.entries.len())
            .field("capacity", &self.entries.cap())
            .field("ttl", &self.ttl)
            .field("clock", &self.clock)
            .finish()
    }
}

impl<K: Eq + Hash + Clone, V> TtlCache<K, V, SystemClock> {
    /// Create a cache on the system clock.
    #[must_use]
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self::with_clock(ttl, capacity, SystemClock)
    }
}

impl<K: Eq + Hash + Clone, V, C: Clock> TtlCache<K, V, C> {
    /// Create a cache on the given clock.
    #[must_use]
    pub fn with_clock(ttl: Duration, capacity: usize, clock: C) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            ttl: Duration::from_secs(ttl.as_secs().clamp(1, MAX_CACHE_TTL_SECS)),
            clock,
        }
    }

    /// The effective TTL after clamping.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The effective capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Look up a live entry. An expired entry is removed.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let now = self.clock.now();
        let ttl = self.ttl;
        if self
            .entries
            .peek(key)
            .is_some_and(|entry| expired(entry.inserted_at, now, ttl))
        {
            self.entries.pop(key);
            return None;
        }
        self.entries.get(key).map(|entry| &entry.value)
    }

    /// Insert or replace an entry. Expired entries are purged first, then the
    /// least recently used one is evicted if still full.
    pub fn insert(&mut self, key: K, value: V) {
        self.purge_expired();
        let entry = Entry {
            inserted_at: self.clock.now(),
            value,
        };
        self.entries.put(key, entry);
    }

    /// Drop every expired entry. Returns how many were dropped.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now();
        let ttl = self.ttl;
        let stale: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| expired(entry.inserted_at, now, ttl))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            self.entries.pop(key);
        }
        stale.len()
    }

    /// Number of stored entries, including expired ones not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// A clock that moved backwards never expires anything.
fn expired(inserted_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    (now - inserted_at).to_std().is_ok_and(|age| age > ttl)
}

//! Time-to-live memoization of fetch+normalize results.
//!
//! One slot per key. A slot is valid while `now - fetched_at < ttl`; an invalid
//! slot is never returned and gets recomputed on the next lookup. Whatever the
//! producer returns is stored, failures included.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::domain::IndicatorCode;

/// Source of "now" for expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for deterministic expiry tests.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.origin + offset
    }
}

/// Cache key: which source, with which parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Indicator { code: IndicatorCode, year: String },
    Seismic,
}

impl CacheKey {
    pub fn indicator(code: IndicatorCode, year: &str) -> Self {
        Self::Indicator {
            code,
            year: year.to_string(),
        }
    }

    pub fn source_id(&self) -> &'static str {
        match self {
            CacheKey::Indicator { .. } => "indicator",
            CacheKey::Seismic => "seismos",
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    fetched_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_valid(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) < self.ttl
    }
}

/// Thread-safe TTL cache. Entries are replaced whole; the lock is released
/// while the producer runs, so racing misses may both produce.
pub struct ExpiringCache<K, V> {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> ExpiringCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key` if still valid, otherwise run
    /// `producer`, store its result for `ttl` and return it.
    pub fn get_or_fetch<F>(&self, key: &K, ttl: Duration, producer: F) -> V
    where
        F: FnOnce() -> V,
    {
        self.get_or_fetch_with(key, producer, |_| ttl)
    }

    /// Like `get_or_fetch`, but the TTL is chosen from the produced value.
    pub fn get_or_fetch_with<F, T>(&self, key: &K, producer: F, ttl_for: T) -> V
    where
        F: FnOnce() -> V,
        T: FnOnce(&V) -> Duration,
    {
        if let Some(value) = self.get(key) {
            debug!(?key, "cache hit");
            return value;
        }

        debug!(?key, "cache miss");
        let value = producer();
        let ttl = ttl_for(&value);
        let entry = CacheEntry {
            value: value.clone(),
            fetched_at: self.clock.now(),
            ttl,
        };
        self.lock().insert(key.clone(), entry);
        value
    }

    /// Valid cached value, if any. Never returns an expired entry.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        self.lock()
            .get(key)
            .filter(|entry| entry.is_valid(now))
            .map(|entry| entry.value.clone())
    }

    pub fn invalidate(&self, key: &K) -> bool {
        self.lock().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Drop expired entries; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_valid(now));
        before - entries.len()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, CacheEntry<V>>> {
        // A panicking producer never holds the lock, so poisoned data is still whole.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<K, V> Default for ExpiringCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn cache_with_clock() -> (ExpiringCache<CacheKey, Result<u32, String>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (ExpiringCache::with_clock(clock.clone()), clock)
    }

    #[test]
    fn hit_within_ttl_skips_producer() {
        let (cache, clock) = cache_with_clock();
        let key = CacheKey::indicator(IndicatorCode::Uf, "2024");
        let calls = Cell::new(0);
        let produce = || {
            calls.set(calls.get() + 1);
            Ok(calls.get())
        };

        assert_eq!(cache.get_or_fetch(&key, Duration::from_secs(60), produce), Ok(1));
        clock.advance(Duration::from_secs(59));
        assert_eq!(cache.get_or_fetch(&key, Duration::from_secs(60), produce), Ok(1));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn expired_entry_is_recomputed() {
        let (cache, clock) = cache_with_clock();
        let key = CacheKey::Seismic;

        cache.get_or_fetch(&key, Duration::from_secs(60), || Ok(1));
        clock.advance(Duration::from_secs(60));
        assert_eq!(cache.get(&key), None);
        assert_eq!(cache.get_or_fetch(&key, Duration::from_secs(60), || Ok(2)), Ok(2));
    }

    #[test]
    fn failures_are_cached_for_their_window() {
        let (cache, clock) = cache_with_clock();
        let key = CacheKey::Seismic;

        let first = cache.get_or_fetch(&key, Duration::from_secs(10), || Err("down".to_string()));
        assert!(first.is_err());
        let second = cache.get_or_fetch(&key, Duration::from_secs(10), || Ok(7));
        assert_eq!(second, Err("down".to_string()));

        clock.advance(Duration::from_secs(10));
        assert_eq!(cache.get_or_fetch(&key, Duration::from_secs(10), || Ok(7)), Ok(7));
    }

    #[test]
    fn ttl_can_depend_on_value() {
        let (cache, clock) = cache_with_clock();
        let key = CacheKey::indicator(IndicatorCode::Euro, "2023");
        let ttl_for = |v: &Result<u32, String>| {
            if v.is_ok() {
                Duration::from_secs(3600)
            } else {
                Duration::from_secs(5)
            }
        };

        cache.get_or_fetch_with(&key, || Err("boom".to_string()), ttl_for);
        clock.advance(Duration::from_secs(5));
        assert_eq!(cache.get_or_fetch_with(&key, || Ok(3), ttl_for), Ok(3));
        clock.advance(Duration::from_secs(1800));
        assert_eq!(cache.get_or_fetch_with(&key, || Ok(4), ttl_for), Ok(3));
    }

    #[test]
    fn keys_are_independent_and_equal_keys_share_a_slot() {
        let (cache, _clock) = cache_with_clock();
        let ttl = Duration::from_secs(60);

        cache.get_or_fetch(&CacheKey::indicator(IndicatorCode::Uf, "2024"), ttl, || Ok(1));
        cache.get_or_fetch(&CacheKey::indicator(IndicatorCode::Uf, "2023"), ttl, || Ok(2));
        let again = cache.get_or_fetch(&CacheKey::indicator(IndicatorCode::Uf, "2024"), ttl, || Ok(3));

        assert_eq!(again, Ok(1));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn zero_ttl_never_hits() {
        let (cache, _clock) = cache_with_clock();
        cache.get_or_fetch(&CacheKey::Seismic, Duration::ZERO, || Ok(1));
        assert_eq!(cache.get_or_fetch(&CacheKey::Seismic, Duration::ZERO, || Ok(2)), Ok(2));
    }

    #[test]
    fn purge_and_invalidate() {
        let (cache, clock) = cache_with_clock();
        cache.get_or_fetch(&CacheKey::Seismic, Duration::from_secs(1), || Ok(1));
        cache.get_or_fetch(&CacheKey::indicator(IndicatorCode::Ipc, "2022"), Duration::from_secs(100), || Ok(2));

        clock.advance(Duration::from_secs(2));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);

        assert!(cache.invalidate(&CacheKey::indicator(IndicatorCode::Ipc, "2022")));
        assert!(cache.is_empty());
    }

    #[test]
    fn source_ids() {
        assert_eq!(CacheKey::Seismic.source_id(), "seismos");
        assert_eq!(CacheKey::indicator(IndicatorCode::Tpm, "2024").source_id(), "indicator");
    }
}

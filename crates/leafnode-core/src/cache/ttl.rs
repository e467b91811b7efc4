//! Bounded TTL cache keyed by query string

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::clock::Clock;

/// Configuration for a [`TtlCache`]
#[derive(Debug, Clone, Copy)]
pub struct TtlCacheConfig {
    /// Maximum number of live entries
    pub max_size: usize,
    /// Time an entry stays readable after it was stored
    pub ttl: Duration,
}

impl Default for TtlCacheConfig {
    fn default() -> Self {
        Self {
            max_size: 100,
            ttl: Duration::from_secs(5 * 60),
        }
    }
}

/// Cache counters since construction (or the last `clear`)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    pub evicted_count: u64,
    pub expired_count: u64,
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    expires_at: Instant,
}

struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// Keys in insertion order, oldest first
    order: VecDeque<String>,
    stats: CacheStats,
}

impl<V> Inner<V> {
    fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        Some(entry)
    }

    fn evict_oldest(&mut self) -> Option<String> {
        let key = self.order.pop_front()?;
        self.entries.remove(&key);
        Some(key)
    }
}

/// Process-local cache with a fixed capacity and a fixed time-to-live.
///
/// When full, the insertion-order oldest entry is evicted. Expired entries
/// are dropped lazily when read.
pub struct TtlCache<V> {
    config: TtlCacheConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner<V>>,
}

impl<V: Clone> TtlCache<V> {
    /// Create a new cache
    pub fn new(config: TtlCacheConfig, clock: Arc<dyn Clock>) -> Self {
        info!(
            "Initializing TTL cache (max_size: {}, ttl: {:?})",
            config.max_size, config.ttl
        );

        Self {
            config,
            clock,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
                stats: CacheStats::default(),
            }),
        }
    }

    /// Get a live entry, evicting it if it has expired
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        let lookup = inner
            .entries
            .get(key)
            .map(|entry| {
                if now <= entry.expires_at {
                    Ok(entry.value.clone())
                } else {
                    Err(now.saturating_duration_since(entry.stored_at))
                }
            });

        match lookup {
            Some(Ok(value)) => {
                inner.stats.hit_count += 1;
                return Some(value);
            }
            Some(Err(age)) => {
                debug!("Cache entry expired: {} (stored {:?} ago)", key, age);
                inner.remove(key);
                inner.stats.expired_count += 1;
            }
            None => {}
        }
        inner.stats.miss_count += 1;
        None
    }

    /// Store a value, evicting the oldest entry when at capacity
    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        if inner.remove(&key).is_none() {
            while self.config.max_size > 0 && inner.entries.len() >= self.config.max_size {
                match inner.evict_oldest() {
                    Some(evicted) => {
                        debug!("Evicting cache entry: {}", evicted);
                        inner.stats.evicted_count += 1;
                    }
                    None => break,
                }
            }
        }

        if self.config.max_size == 0 {
            return;
        }

        inner.order.push_back(key.clone());
        inner.entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: now,
                expires_at: now + self.config.ttl,
            },
        );
    }

    /// Remove every entry and reset counters
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        let count = inner.entries.len();
        inner.entries.clear();
        inner.order.clear();
        inner.stats = CacheStats::default();
        info!("Cleared {} cache entries", count);
    }

    /// Number of stored entries (expired ones included until read)
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            entries: inner.entries.len(),
            ..inner.stats
        }
    }

    pub fn config(&self) -> TtlCacheConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn create_test_cache(max_size: usize, ttl_secs: u64) -> (TtlCache<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = TtlCache::new(
            TtlCacheConfig {
                max_size,
                ttl: Duration::from_secs(ttl_secs),
            },
            clock.clone(),
        );
        (cache, clock)
    }

    #[test]
    fn test_get_returns_value_within_ttl() {
        let (cache, clock) = create_test_cache(10, 300);
        cache.set("intitle:dune", "volume-1".to_string());

        clock.advance(Duration::from_secs(299));
        assert_eq!(cache.get("intitle:dune"), Some("volume-1".to_string()));
    }

    #[test]
    fn test_get_evicts_after_ttl() {
        let (cache, clock) = create_test_cache(10, 300);
        cache.set("intitle:dune", "volume-1".to_string());

        clock.advance(Duration::from_secs(301));
        assert_eq!(cache.get("intitle:dune"), None);
        assert!(cache.is_empty());

        let stats = cache.stats();
        assert_eq!(stats.expired_count, 1);
        assert_eq!(stats.miss_count, 1);
    }

    #[test]
    fn test_missing_key_is_a_miss() {
        let (cache, _clock) = create_test_cache(10, 300);
        assert_eq!(cache.get("nothing"), None);
        assert_eq!(cache.stats().miss_count, 1);
        assert_eq!(cache.stats().hit_count, 0);
    }

    #[test]
    fn test_capacity_evicts_oldest_inserted() {
        let (cache, _clock) = create_test_cache(3, 300);
        for i in 0..5 {
            cache.set(format!("key-{}", i), format!("value-{}", i));
        }

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("key-0"), None);
        assert_eq!(cache.get("key-1"), None);
        assert_eq!(cache.get("key-2"), Some("value-2".to_string()));
        assert_eq!(cache.get("key-3"), Some("value-3".to_string()));
        assert_eq!(cache.get("key-4"), Some("value-4".to_string()));
        assert_eq!(cache.stats().evicted_count, 2);
    }

    #[test]
    fn test_reset_key_moves_to_newest_without_eviction() {
        let (cache, _clock) = create_test_cache(2, 300);
        cache.set("a", "1".to_string());
        cache.set("b", "2".to_string());

        // Updating an existing key at capacity must not evict anything
        cache.set("a", "1b".to_string());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evicted_count, 0);

        // "b" is now the oldest
        cache.set("c", "3".to_string());
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("a"), Some("1b".to_string()));
        assert_eq!(cache.get("c"), Some("3".to_string()));
    }

    #[test]
    fn test_reset_key_refreshes_expiry() {
        let (cache, clock) = create_test_cache(10, 300);
        cache.set("a", "1".to_string());
        clock.advance(Duration::from_secs(200));
        cache.set("a", "2".to_string());
        clock.advance(Duration::from_secs(200));

        assert_eq!(cache.get("a"), Some("2".to_string()));
    }

    #[test]
    fn test_clear_removes_everything() {
        let (cache, _clock) = create_test_cache(10, 300);
        cache.set("a", "1".to_string());
        cache.set("b", "2".to_string());
        cache.get("a");

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let (cache, _clock) = create_test_cache(0, 300);
        cache.set("a", "1".to_string());
        assert!(cache.is_empty());
    }
}

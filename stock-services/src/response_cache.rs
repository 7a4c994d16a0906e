//! Response Cache
//!
//! In-memory keyed store with a per-entry time-to-live. Entries are evicted
//! lazily on lookup and by an optional background sweeper. Nothing is
//! persisted; a restart starts from an empty cache.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

/// Cached value with its expiry, fixed at write time
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Keyed cache with per-entry TTL
#[derive(Debug)]
pub struct ResponseCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Look up a live entry. Expired entries behave as a miss and are evicted.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if entry.is_fresh(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Re-check under the write lock; a writer may have replaced it meanwhile
        let mut entries = self.entries.write();
        match entries.get(key) {
            Some(entry) if entry.is_fresh(now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                debug!("Evicted expired cache entry: {}", key);
                None
            }
            None => None,
        }
    }

    /// Store a value, replacing any previous entry for the key
    ///
    /// The TTL runs from this moment and is not extended by reads.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().insert(key.into(), entry);
    }

    /// Remove every entry whose key starts with `prefix`, or everything when
    /// no prefix is given. Returns the number of entries removed.
    pub fn invalidate(&self, prefix: Option<&str>) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();

        match prefix {
            Some(prefix) => entries.retain(|key, _| !key.starts_with(prefix)),
            None => entries.clear(),
        }

        let removed = before - entries.len();
        info!("Invalidated {} cache entries (prefix: {:?})", removed, prefix);
        removed
    }

    /// Drop every expired entry. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.entries.read();

        let total = entries.len();
        let live = entries.values().filter(|e| e.is_fresh(now)).count();

        CacheStats {
            total,
            live,
            expired: total - live,
        }
    }
}

impl<V: Clone + Send + Sync + 'static> ResponseCache<V> {
    /// Spawn a task purging expired entries every `period`
    ///
    /// The task holds only a weak reference and exits once the cache is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let cache: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            info!("Response cache sweeper started (every {:?})", period);
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                let Some(cache) = cache.upgrade() else {
                    debug!("Response cache dropped, sweeper exiting");
                    break;
                };
                let purged = cache.purge_expired();
                if purged > 0 {
                    debug!("Swept {} expired cache entries", purged);
                }
            }
        })
    }
}

impl<V: Clone> Default for ResponseCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub total: usize,
    pub live: usize,
    pub expired: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_set_then_get_round_trip() {
        let cache = ResponseCache::new();
        cache.set("NVDA_history_50", 42u32, Duration::from_secs(30));

        assert_eq!(cache.get("NVDA_history_50"), Some(42));
        assert_eq!(cache.get("PYPL_history_50"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = ResponseCache::new();
        cache.set("k", "v".to_string(), Duration::from_secs(30));

        tokio::time::advance(Duration::from_secs(29)).await;
        assert_eq!(cache.get("k").as_deref(), Some("v"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("k"), None);
        // Lazily evicted on the missed lookup
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reads_do_not_extend_ttl() {
        let cache = ResponseCache::new();
        cache.set("k", 1, Duration::from_secs(10));

        for _ in 0..9 {
            tokio::time::advance(Duration::from_secs(1)).await;
            assert_eq!(cache.get("k"), Some(1));
        }

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("k"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_is_per_entry() {
        let cache = ResponseCache::new();
        cache.set("all_stocks", 1, Duration::from_secs(3600));
        cache.set("NVDA_history_50", 2, Duration::from_secs(30));

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(cache.get("all_stocks"), Some(1));
        assert_eq!(cache.get("NVDA_history_50"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_resets_expiry() {
        let cache = ResponseCache::new();
        cache.set("k", 1, Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.set("k", 2, Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(8)).await;

        assert_eq!(cache.get("k"), Some(2));
    }

    #[test]
    fn test_invalidate_by_prefix_and_flush() {
        let cache = ResponseCache::new();
        let ttl = Duration::from_secs(60);
        cache.set("NVDA_history_50", 1, ttl);
        cache.set("NVDA_history_10", 2, ttl);
        cache.set("PYPL_history_50", 3, ttl);
        cache.set("all_stocks", 4, ttl);

        assert_eq!(cache.invalidate(Some("NVDA")), 2);
        assert_eq!(cache.get("NVDA_history_50"), None);
        assert_eq!(cache.get("PYPL_history_50"), Some(3));

        assert_eq!(cache.invalidate(None), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_and_stats() {
        let cache = ResponseCache::new();
        cache.set("short", 1, Duration::from_secs(5));
        cache.set("long", 2, Duration::from_secs(500));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(
            cache.stats(),
            CacheStats {
                total: 2,
                live: 1,
                expired: 1
            }
        );

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_purges_in_background() {
        let cache = Arc::new(ResponseCache::new());
        cache.set("short", 1, Duration::from_secs(5));
        let handle = cache.spawn_sweeper(Duration::from_secs(15));

        tokio::time::sleep(Duration::from_secs(16)).await;
        assert_eq!(cache.len(), 0);

        drop(cache);
        tokio::time::sleep(Duration::from_secs(16)).await;
        assert!(handle.is_finished());
    }
}

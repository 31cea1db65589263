//! In-memory TTL cache scoped to one API client

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Cache entry with expiry metadata
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    expires_at: Instant,
    access_count: u64,
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expired_entries: u64,
    pub total_entries: u64,
}

/// Key/value cache whose entries expire a fixed duration after insertion.
///
/// Expired entries are never returned and are evicted lazily on lookup.
#[derive(Debug)]
pub struct TtlCache<T> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
    stats: Mutex<CacheStats>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            stats: Mutex::new(CacheStats::default()),
        }
    }

    /// Return a live entry, evicting it if it has expired
    pub async fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.lock().await;
        let mut stats = self.stats.lock().await;
        let now = Instant::now();

        match entries.get_mut(key) {
            Some(entry) if entry.expires_at > now => {
                entry.access_count += 1;
                stats.hits += 1;
                debug!(key, access_count = entry.access_count, "Cache hit");
                Some(entry.data.clone())
            }
            Some(_) => {
                entries.remove(key);
                stats.misses += 1;
                stats.expired_entries += 1;
                stats.total_entries = entries.len() as u64;
                debug!(key, "Cache entry expired");
                None
            }
            None => {
                stats.misses += 1;
                debug!(key, "Cache miss");
                None
            }
        }
    }

    pub async fn insert(&self, key: impl Into<String>, data: T, ttl: Duration) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.into(),
            CacheEntry {
                data,
                expires_at: Instant::now() + ttl,
                access_count: 0,
            },
        );
        self.stats.lock().await.total_entries = entries.len() as u64;
    }

    /// Discard every entry
    pub async fn clear(&self) {
        let mut entries = self.entries.lock().await;
        let cleared = entries.len();
        entries.clear();
        self.stats.lock().await.total_entries = 0;
        debug!(cleared, "Cache cleared");
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        self.stats.lock().await.clone()
    }
}

impl<T: Clone> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

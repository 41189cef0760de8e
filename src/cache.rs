//! In-process cache for resolved API keys.
//!
//! The credential resolver receives a [`KeyCache`] rather than owning a global map.
//! Entries expire after a fixed TTL: a lookup never returns a stale entry, and
//! [`spawn_sweeper`] evicts expired entries periodically so memory stays bounded
//! even for keys that are never looked up again.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Get/put/expire capability for cached key resolutions.
#[async_trait]
pub trait KeyCache<V>: Send + Sync
where
    V: Clone + Send + Sync + 'static,
{
    /// Returns the cached value if present and not expired.
    async fn get(&self, key: &str) -> Option<V>;

    /// Stores `value` under `key`, replacing any previous entry.
    async fn put(&self, key: String, value: V);

    /// Drops every expired entry and returns how many were removed.
    async fn evict_expired(&self) -> usize;

    /// Number of entries currently held, expired or not.
    async fn len(&self) -> usize;
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// [`KeyCache`] backed by a `HashMap` with a fixed time-to-live.
#[derive(Debug)]
pub struct TtlCache<V> {
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry<V>>>,
}

impl<V> TtlCache<V> {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<V> KeyCache<V> for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone())
    }

    async fn put(&self, key: String, value: V) {
        let expires_at = Instant::now() + self.ttl;
        let mut entries = self.entries.write().await;
        entries.insert(key, Entry { value, expires_at });
    }

    async fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        let removed = before - entries.len();
        trace!(removed, remaining = entries.len(), "Key cache sweep");
        removed
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Shortest sweep period; `tokio::time::interval` rejects zero
const MIN_SWEEP_PERIOD: Duration = Duration::from_millis(1);

/// Runs [`KeyCache::evict_expired`] every `every` until the task is aborted.
pub fn spawn_sweeper<V>(cache: Arc<dyn KeyCache<V>>, every: Duration) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every.max(MIN_SWEEP_PERIOD));
        loop {
            ticker.tick().await;
            let removed = cache.evict_expired().await;
            if removed > 0 {
                debug!(removed, "Evicted expired API key cache entries");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let cache: TtlCache<i64> = TtlCache::new(Duration::from_secs(300));
        cache.put("key".to_string(), 7).await;
        assert_eq!(cache.get("key").await, Some(7));
        assert_eq!(cache.get("other").await, None);
    }

    #[tokio::test]
    async fn test_expired_entries_are_hidden_and_evicted() {
        let cache: TtlCache<i64> = TtlCache::new(Duration::ZERO);
        cache.put("key".to_string(), 7).await;
        assert_eq!(cache.get("key").await, None);
        assert_eq!(cache.len().await, 1);

        assert_eq!(cache.evict_expired().await, 1);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_eviction_keeps_live_entries() {
        let cache: TtlCache<i64> = TtlCache::new(Duration::from_secs(300));
        cache.put("a".to_string(), 1).await;
        cache.put("b".to_string(), 2).await;
        assert_eq!(cache.evict_expired().await, 0);
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_sweeper_evicts_in_background() {
        let cache: Arc<dyn KeyCache<i64>> = Arc::new(TtlCache::new(Duration::ZERO));
        cache.put("key".to_string(), 1).await;

        let handle = spawn_sweeper(Arc::clone(&cache), Duration::from_millis(5));
        for _ in 0..50 {
            if cache.len().await == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        handle.abort();
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_sweeper_survives_zero_period() {
        let cache: Arc<dyn KeyCache<i64>> = Arc::new(TtlCache::new(Duration::ZERO));
        cache.put("key".to_string(), 1).await;

        let handle = spawn_sweeper(Arc::clone(&cache), Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!handle.is_finished());
        handle.abort();
        assert_eq!(cache.len().await, 0);
    }
}

//! In-process cache with per-entry expiry. Used when no Redis URL is configured.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use inkwell_core::ports::{Cache, CacheError};

struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }
}

/// HashMap behind an async RwLock. An expired entry is dropped when it is read,
/// and every write sweeps all expired entries so unread keys cannot pile up.
///
/// Contents are lost on restart.
pub struct InMemoryCache {
    store: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        {
            let store = self.store.read().await;
            let entry = store.get(key)?;
            if !entry.is_expired(now) {
                return Some(entry.value.clone());
            }
        }

        let mut store = self.store.write().await;
        if store.get(key).is_some_and(|entry| entry.is_expired(now)) {
            store.remove(key);
        }
        None
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let now = Instant::now();
        let expires_at = ttl.map(|d| now + d);

        let mut store = self.store.write().await;
        store.retain(|_, entry| !entry.is_expired(now));
        store.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.write().await.remove(key);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
        let mut store = self.store.write().await;
        let before = store.len();
        store.retain(|key, _| !key.starts_with(prefix));
        Ok(before - store.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = InMemoryCache::new();
        cache.set("key1", "value1", None).await.unwrap();
        assert_eq!(cache.get("key1").await, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = InMemoryCache::new();
        cache.set("key1", "value1", None).await.unwrap();
        cache.delete("key1").await.unwrap();
        assert_eq!(cache.get("key1").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = InMemoryCache::new();
        cache
            .set("index_page:page=1", "body", Some(Duration::from_secs(20)))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(19)).await;
        assert_eq!(cache.get("index_page:page=1").await.as_deref(), Some("body"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("index_page:page=1").await, None);
    }

    #[tokio::test]
    async fn test_delete_prefix_only_touches_matching_keys() {
        let cache = InMemoryCache::new();
        cache.set("index_page:page=1", "a", None).await.unwrap();
        cache.set("index_page:page=2", "b", None).await.unwrap();
        cache.set("session:1", "c", None).await.unwrap();

        assert_eq!(cache.delete_prefix("index_page:").await.unwrap(), 2);
        assert_eq!(cache.get("session:1").await.as_deref(), Some("c"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_sweep_expired_entries() {
        let cache = InMemoryCache::new();
        let ttl = Some(Duration::from_secs(20));
        for n in 1..=100 {
            cache
                .set(&format!("index_page:page={n}"), "stale", ttl)
                .await
                .unwrap();
        }
        cache.set("pinned", "kept", None).await.unwrap();

        tokio::time::advance(Duration::from_secs(3600)).await;
        cache.set("index_page:page=1", "fresh", ttl).await.unwrap();

        assert_eq!(cache.store.read().await.len(), 2);
        assert_eq!(cache.get("pinned").await.as_deref(), Some("kept"));
    }
}

//! In-memory cache implementation using moka
//!
//! Thread-safe cache with TTL-based expiration and glob-style pattern
//! invalidation for bulk deletes.

use super::CacheLayer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use moka::future::Cache;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Default maximum cache capacity (number of entries)
const DEFAULT_MAX_CAPACITY: u64 = 10_000;

/// Default TTL for cache entries
const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Cache entry wrapper storing the JSON-serialized value
#[derive(Clone)]
struct CacheEntry {
    data: Arc<String>,
}

impl CacheEntry {
    fn new<T: Serialize>(value: &T) -> Result<Self> {
        let json = serde_json::to_string(value).context("Failed to serialize cache value")?;
        Ok(Self {
            data: Arc::new(json),
        })
    }

    fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.data).context("Failed to deserialize cache value")
    }
}

/// In-memory cache using moka
pub struct MemoryCache {
    cache: Cache<String, CacheEntry>,
    default_ttl: Duration,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entry_count", &self.cache.entry_count())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl MemoryCache {
    /// Create a new memory cache with default settings
    pub fn new() -> Self {
        Self::with_capacity_and_ttl(DEFAULT_MAX_CAPACITY, DEFAULT_TTL)
    }

    /// Create a new memory cache with custom capacity and TTL
    pub fn with_capacity_and_ttl(max_capacity: u64, default_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(default_ttl)
            .support_invalidation_closures()
            .build();

        Self { cache, default_ttl }
    }

    /// Current number of entries
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Glob-style pattern match: `*` matches any sequence of characters.
    fn pattern_matches(pattern: &str, key: &str) -> bool {
        let parts: Vec<&str> = pattern.split('*').collect();
        if parts.len() == 1 {
            return pattern == key;
        }

        let mut rest = key;
        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() {
                continue;
            }
            if i == 0 {
                match rest.strip_prefix(part) {
                    Some(r) => rest = r,
                    None => return false,
                }
            } else if i == parts.len() - 1 {
                return rest.ends_with(part);
            } else {
                match rest.find(part) {
                    Some(idx) => rest = &rest[idx + part.len()..],
                    None => return false,
                }
            }
        }
        true
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheLayer for MemoryCache {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self.cache.get(key).await {
            Some(entry) => Ok(Some(entry.deserialize()?)),
            None => Ok(None),
        }
    }

    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        _ttl: Duration,
    ) -> Result<()> {
        // moka applies the cache-wide TTL; per-entry TTL is accepted for
        // interface compatibility but not honored individually
        let entry = CacheEntry::new(value)?;
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        let pattern = pattern.to_string();
        self.cache
            .invalidate_entries_if(move |key, _| Self::pattern_matches(&pattern, key))
            .map_err(|e| anyhow::anyhow!("Failed to invalidate entries: {}", e))?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.cache.invalidate_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryCache::new();

        cache
            .set("key", &42i64, Duration::from_secs(60))
            .await
            .unwrap();

        let value: Option<i64> = cache.get("key").await.unwrap();
        assert_eq!(value, Some(42));
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let cache = MemoryCache::new();

        let value: Option<String> = cache.get("missing").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = MemoryCache::new();
        cache
            .set("key", &"value".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        cache.delete("key").await.unwrap();

        let value: Option<String> = cache.get("key").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_delete_pattern() {
        let cache = MemoryCache::new();
        cache.set("books:page:1", &1i64, Duration::from_secs(60)).await.unwrap();
        cache.set("books:page:2", &2i64, Duration::from_secs(60)).await.unwrap();
        cache.set("posts:page:1", &3i64, Duration::from_secs(60)).await.unwrap();

        cache.delete_pattern("books:*").await.unwrap();
        // Invalidation closures apply lazily; reads see the invalidation
        let one: Option<i64> = cache.get("books:page:1").await.unwrap();
        let two: Option<i64> = cache.get("books:page:2").await.unwrap();
        let other: Option<i64> = cache.get("posts:page:1").await.unwrap();

        assert_eq!(one, None);
        assert_eq!(two, None);
        assert_eq!(other, Some(3));
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = MemoryCache::new();
        cache.set("a", &1i64, Duration::from_secs(60)).await.unwrap();
        cache.set("b", &2i64, Duration::from_secs(60)).await.unwrap();

        cache.clear().await.unwrap();

        let a: Option<i64> = cache.get("a").await.unwrap();
        assert_eq!(a, None);
    }

    #[test]
    fn test_pattern_matching() {
        assert!(MemoryCache::pattern_matches("books:*", "books:page:1"));
        assert!(MemoryCache::pattern_matches("*", "anything"));
        assert!(MemoryCache::pattern_matches("exact", "exact"));
        assert!(MemoryCache::pattern_matches("a*c", "abc"));
        assert!(!MemoryCache::pattern_matches("books:*", "posts:page:1"));
        assert!(!MemoryCache::pattern_matches("exact", "not-exact"));
    }

    #[tokio::test]
    async fn test_complex_value_round_trip() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Payload {
            items: Vec<String>,
            total: i64,
        }

        let cache = MemoryCache::new();
        let payload = Payload {
            items: vec!["a".into(), "b".into()],
            total: 2,
        };

        cache
            .set("payload", &payload, Duration::from_secs(60))
            .await
            .unwrap();

        let got: Option<Payload> = cache.get("payload").await.unwrap();
        assert_eq!(got, Some(payload));
    }
}

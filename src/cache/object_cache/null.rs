use async_trait::async_trait;
use tracing::trace;

use crate::cache::{CacheResult, ObjectCache};
use crate::storage::LinkRecord;

/// `cache.type = "null"`：所有读取都是 Miss
pub struct NullObjectCache;

impl NullObjectCache {
    pub fn new() -> Self {
        trace!("Using NullObjectCache: caching disabled");
        NullObjectCache
    }
}

impl Default for NullObjectCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectCache for NullObjectCache {
    async fn get(&self, key: &str) -> CacheResult {
        trace!("NullObjectCache.get called for key: {}", key);
        CacheResult::Miss
    }

    async fn insert(&self, key: &str, _: LinkRecord) {
        trace!("NullObjectCache.insert called for key: {}", key);
    }

    async fn remove(&self, key: &str) {
        trace!("NullObjectCache.remove called for key: {}", key);
    }

    async fn invalidate_all(&self) {
        trace!("NullObjectCache.invalidate_all called, but no action taken");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_cache_never_hits() {
        let cache = NullObjectCache::new();
        let link = LinkRecord::new("test", "https://example.com", chrono::Utc::now());

        cache.insert("test", link).await;
        assert!(matches!(cache.get("test").await, CacheResult::Miss));

        cache.remove("test").await;
        cache.invalidate_all().await;
        assert_eq!(cache.entry_count(), 0);
    }
}

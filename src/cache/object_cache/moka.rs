use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::policy::{EvictionPolicy, Expiry};
use tracing::debug;

use crate::cache::{CacheResult, ObjectCache, cache_ttl};
use crate::storage::LinkRecord;

/// 基于 LinkRecord.expires_at 计算每个条目的过期时间
struct LinkExpiry {
    default_ttl: Duration,
}

impl LinkExpiry {
    fn ttl_for(&self, value: &LinkRecord) -> Option<Duration> {
        Some(cache_ttl(value, self.default_ttl, chrono::Utc::now()).unwrap_or(Duration::ZERO))
    }
}

impl Expiry<String, LinkRecord> for LinkExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &LinkRecord,
        _created_at: Instant,
    ) -> Option<Duration> {
        self.ttl_for(value)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &LinkRecord,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        self.ttl_for(value)
    }
}

/// 进程内 LRU 缓存
pub struct MokaObjectCache {
    inner: Cache<String, LinkRecord>,
}

impl MokaObjectCache {
    pub fn new(max_capacity: u64, default_ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .eviction_policy(EvictionPolicy::lru())
            .expire_after(LinkExpiry { default_ttl })
            .build();

        debug!(
            "MokaObjectCache initialized with max capacity: {}, default TTL: {}s",
            max_capacity,
            default_ttl.as_secs()
        );
        Self { inner }
    }

    /// 执行挂起的维护任务（淘汰、过期），测试中用于获得确定的条目数
    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }
}

#[async_trait]
impl ObjectCache for MokaObjectCache {
    async fn get(&self, key: &str) -> CacheResult {
        match self.inner.get(key).await {
            Some(value) => CacheResult::Found(value),
            None => CacheResult::Miss,
        }
    }

    async fn insert(&self, key: &str, value: LinkRecord) {
        self.inner.insert(key.to_string(), value).await;
    }

    async fn remove(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    async fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(code: &str) -> LinkRecord {
        LinkRecord::new(code, "https://example.com", Utc::now())
    }

    #[tokio::test]
    async fn test_insert_get_remove() {
        let cache = MokaObjectCache::new(100, Duration::from_secs(60));
        cache.insert("abc", record("abc")).await;

        match cache.get("abc").await {
            CacheResult::Found(r) => assert_eq!(r.code, "abc"),
            CacheResult::Miss => panic!("expected hit"),
        }

        cache.remove("abc").await;
        assert!(matches!(cache.get("abc").await, CacheResult::Miss));
    }

    #[tokio::test]
    async fn test_entry_expires_with_record() {
        let cache = MokaObjectCache::new(100, Duration::from_secs(3600));
        let mut r = record("short");
        r.expires_at = Some(Utc::now() + chrono::Duration::milliseconds(150));
        cache.insert("short", r).await;
        assert!(matches!(cache.get("short").await, CacheResult::Found(_)));

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(matches!(cache.get("short").await, CacheResult::Miss));
    }

    #[tokio::test]
    async fn test_capacity_is_bounded() {
        let cache = MokaObjectCache::new(10, Duration::from_secs(60));
        for i in 0..50 {
            let code = format!("c{}", i);
            cache.insert(&code, record(&code)).await;
        }
        cache.run_pending_tasks().await;
        assert!(cache.entry_count() <= 10);
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let cache = MokaObjectCache::new(100, Duration::from_secs(60));
        cache.insert("a", record("a")).await;
        cache.insert("b", record("b")).await;
        cache.invalidate_all().await;
        assert!(matches!(cache.get("a").await, CacheResult::Miss));
        assert!(matches!(cache.get("b").await, CacheResult::Miss));
    }
}

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::warn;

use super::{LinkRecord, LinkStore, Mutation, SearchQuery};
use crate::errors::{Result, SnaplinkError};

/// 为每次存储调用加上截止时间，超时即 `Unavailable`
pub struct DeadlineStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S: LinkStore> DeadlineStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn bounded<T>(&self, op: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Store operation '{}' exceeded deadline of {}ms",
                    op,
                    self.timeout.as_millis()
                );
                Err(SnaplinkError::unavailable(format!(
                    "store operation '{}' timed out after {}ms",
                    op,
                    self.timeout.as_millis()
                )))
            }
        }
    }
}

#[async_trait]
impl<S: LinkStore> LinkStore for DeadlineStore<S> {
    async fn create(&self, record: LinkRecord) -> Result<LinkRecord> {
        self.bounded("create", self.inner.create(record)).await
    }

    async fn get(&self, code: &str) -> Result<LinkRecord> {
        self.bounded("get", self.inner.get(code)).await
    }

    async fn update_atomic(&self, code: &str, mutation: &Mutation<'_>) -> Result<LinkRecord> {
        self.bounded("update_atomic", self.inner.update_atomic(code, mutation))
            .await
    }

    async fn delete(&self, code: &str) -> Result<()> {
        self.bounded("delete", self.inner.delete(code)).await
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<LinkRecord>> {
        self.bounded("list_by_owner", self.inner.list_by_owner(owner))
            .await
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<LinkRecord>> {
        self.bounded("search", self.inner.search(query)).await
    }

    async fn sweep(&self, now: DateTime<Utc>, grace: chrono::Duration) -> Result<u64> {
        self.bounded("sweep", self.inner.sweep(now, grace)).await
    }

    async fn count(&self) -> Result<u64> {
        self.bounded("count", self.inner.count()).await
    }

    async fn health_check(&self) -> Result<()> {
        self.bounded("health_check", self.inner.health_check()).await
    }

    fn backend_name(&self) -> &str {
        self.inner.backend_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    /// 永远不返回的存储
    struct StalledStore;

    #[async_trait]
    impl LinkStore for StalledStore {
        async fn create(&self, _record: LinkRecord) -> Result<LinkRecord> {
            std::future::pending().await
        }
        async fn get(&self, _code: &str) -> Result<LinkRecord> {
            std::future::pending().await
        }
        async fn update_atomic(&self, _code: &str, _m: &Mutation<'_>) -> Result<LinkRecord> {
            std::future::pending().await
        }
        async fn delete(&self, _code: &str) -> Result<()> {
            std::future::pending().await
        }
        async fn list_by_owner(&self, _owner: &str) -> Result<Vec<LinkRecord>> {
            std::future::pending().await
        }
        async fn search(&self, _query: &SearchQuery) -> Result<Vec<LinkRecord>> {
            std::future::pending().await
        }
        async fn sweep(&self, _now: DateTime<Utc>, _grace: chrono::Duration) -> Result<u64> {
            std::future::pending().await
        }
        async fn count(&self) -> Result<u64> {
            std::future::pending().await
        }
        async fn health_check(&self) -> Result<()> {
            std::future::pending().await
        }
        fn backend_name(&self) -> &str {
            "stalled"
        }
    }

    #[tokio::test]
    async fn test_timeout_maps_to_unavailable() {
        let store = DeadlineStore::new(StalledStore, Duration::from_millis(20));
        let err = store.get("abc").await.unwrap_err();
        assert!(matches!(err, SnaplinkError::Unavailable(_)));

        let record = LinkRecord::new("abc", "https://example.com", Utc::now());
        let err = store.create(record).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_passes_results_through() {
        let store = DeadlineStore::new(MemoryStore::new(), Duration::from_secs(1));
        let record = LinkRecord::new("abc", "https://example.com", Utc::now());
        store.create(record.clone()).await.unwrap();
        assert_eq!(store.get("abc").await.unwrap(), record);
        assert!(matches!(
            store.get("missing").await,
            Err(SnaplinkError::NotFound(_))
        ));
        assert_eq!(store.backend_name(), "memory");
    }
}

//! 读穿缓存
//!
//! 缓存只作参考：命中结果仍由存储层的原子更新复核。
//! 不缓存 NotFound，也不缓存已过期或失效的记录。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use super::{CacheResult, ObjectCache, cache_ttl};
use crate::errors::{Result, SnaplinkError};
use crate::storage::LinkRecord;

#[derive(Clone)]
pub struct ReadThroughCache {
    cache: Arc<dyn ObjectCache>,
    default_ttl: Duration,
    timeout: Duration,
}

impl ReadThroughCache {
    pub fn new(cache: Arc<dyn ObjectCache>, default_ttl: Duration, timeout: Duration) -> Self {
        Self {
            cache,
            default_ttl,
            timeout,
        }
    }

    /// 命中返回缓存值；未命中调用 `loader` 并回填
    ///
    /// `loader` 返回 `NotFound` 时结果为 `Ok(None)`，其他错误原样返回。
    pub async fn get_or_load<F, Fut>(&self, code: &str, loader: F) -> Result<Option<LinkRecord>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<LinkRecord>>,
    {
        match tokio::time::timeout(self.timeout, self.cache.get(code)).await {
            Ok(CacheResult::Found(record)) => {
                debug!(target: "snaplink::events", event = "cache_hit", code);
                return Ok(Some(record));
            }
            Ok(CacheResult::Miss) => {
                debug!(target: "snaplink::events", event = "cache_miss", code);
            }
            Err(_) => {
                warn!(
                    target: "snaplink::events",
                    event = "cache_timeout",
                    code,
                    timeout_ms = self.timeout.as_millis() as u64
                );
            }
        }

        match loader().await {
            Ok(record) => {
                self.fill(&record).await;
                Ok(Some(record))
            }
            Err(SnaplinkError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// 变更后调用：可解析则覆盖缓存，否则移除
    pub async fn refresh(&self, record: &LinkRecord) {
        if cache_ttl(record, self.default_ttl, Utc::now()).is_some() {
            self.bounded("refresh", self.cache.insert(&record.code, record.clone()))
                .await;
        } else {
            self.invalidate(&record.code).await;
        }
    }

    pub async fn invalidate(&self, code: &str) {
        self.bounded("invalidate", self.cache.remove(code)).await;
    }

    pub async fn invalidate_all(&self) {
        self.bounded("invalidate_all", self.cache.invalidate_all())
            .await;
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    async fn fill(&self, record: &LinkRecord) {
        if cache_ttl(record, self.default_ttl, Utc::now()).is_some() {
            self.bounded("fill", self.cache.insert(&record.code, record.clone()))
                .await;
        }
    }

    async fn bounded(&self, op: &str, fut: impl Future<Output = ()>) {
        if tokio::time::timeout(self.timeout, fut).await.is_err() {
            warn!(
                "Cache operation '{}' exceeded {}ms",
                op,
                self.timeout.as_millis()
            );
        }
    }
}

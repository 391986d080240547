use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::storage::LinkRecord;

/// 缓存查询结果
#[derive(Debug, Clone)]
pub enum CacheResult {
    Found(LinkRecord),
    Miss,
}

#[async_trait]
pub trait ObjectCache: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult;
    async fn insert(&self, key: &str, value: LinkRecord);
    async fn remove(&self, key: &str);
    async fn invalidate_all(&self);

    /// 近似条目数
    fn entry_count(&self) -> u64 {
        0
    }
}

/// 记录在缓存中的存活时间：min(默认 TTL, 距 expires_at 的剩余时间)
///
/// 已过期或不可解析的记录返回 `None`，不应进入缓存。
pub fn cache_ttl(record: &LinkRecord, default_ttl: Duration, now: DateTime<Utc>) -> Option<Duration> {
    if !record.is_resolvable_at(now) {
        return None;
    }
    match record.expires_at {
        Some(expires_at) => {
            let remaining = (expires_at - now).to_std().ok()?;
            if remaining.is_zero() {
                None
            } else {
                Some(remaining.min(default_ttl))
            }
        }
        None => Some(default_ttl),
    }
}

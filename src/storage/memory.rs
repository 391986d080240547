//! 进程内存储
//!
//! DashMap 的 entry / get_mut 持有分片锁，同一短码上的
//! create 与 update_atomic 因此是原子的。删除和清理留下 `None`
//! 墓碑，短码不会再次签发。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use super::{LinkRecord, LinkStore, Mutation, SearchQuery};
use crate::errors::{Result, SnaplinkError};

fn not_found(code: &str) -> SnaplinkError {
    SnaplinkError::not_found(format!("link '{}' not found", code))
}

#[derive(Default)]
pub struct MemoryStore {
    links: DashMap<String, Option<LinkRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 存活记录数（不含墓碑）
    pub fn len(&self) -> usize {
        self.links.iter().filter(|r| r.value().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn live(&self) -> impl Iterator<Item = LinkRecord> + '_ {
        self.links.iter().filter_map(|r| r.value().clone())
    }
}

#[async_trait]
impl LinkStore for MemoryStore {
    async fn create(&self, mut record: LinkRecord) -> Result<LinkRecord> {
        match self.links.entry(record.code.clone()) {
            Entry::Occupied(_) => Err(SnaplinkError::collision(format!(
                "code '{}' already exists",
                record.code
            ))),
            Entry::Vacant(slot) => {
                record.version = 0;
                slot.insert(Some(record.clone()));
                Ok(record)
            }
        }
    }

    async fn get(&self, code: &str) -> Result<LinkRecord> {
        self.links
            .get(code)
            .and_then(|r| r.value().clone())
            .ok_or_else(|| not_found(code))
    }

    async fn update_atomic(&self, code: &str, mutation: &Mutation<'_>) -> Result<LinkRecord> {
        let mut slot = self.links.get_mut(code).ok_or_else(|| not_found(code))?;
        let Some(current) = slot.value() else {
            return Err(not_found(code));
        };

        let mut next = mutation(current)?;
        next.code = current.code.clone();
        next.created_at = current.created_at;
        next.version = current.version + 1;

        *slot.value_mut() = Some(next.clone());
        debug!("MemoryStore: updated '{}' to version {}", code, next.version);
        Ok(next)
    }

    async fn delete(&self, code: &str) -> Result<()> {
        let mut slot = self.links.get_mut(code).ok_or_else(|| not_found(code))?;
        match slot.value_mut().take() {
            Some(_) => Ok(()),
            None => Err(not_found(code)),
        }
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<LinkRecord>> {
        let mut records: Vec<LinkRecord> = self
            .live()
            .filter(|r| r.owner.as_deref() == Some(owner))
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    /// 区分大小写的字面匹配
    async fn search(&self, query: &SearchQuery) -> Result<Vec<LinkRecord>> {
        let mut records: Vec<LinkRecord> = self
            .live()
            .filter(|r| {
                query
                    .owner
                    .as_deref()
                    .is_none_or(|owner| r.owner.as_deref() == Some(owner))
            })
            .filter(|r| {
                if query.exact {
                    r.target == query.text
                } else {
                    r.target.contains(&query.text)
                }
            })
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(query.limit);
        Ok(records)
    }

    async fn sweep(&self, now: DateTime<Utc>, grace: chrono::Duration) -> Result<u64> {
        let cutoff = now.checked_sub_signed(grace);
        let mut retired = 0;
        for mut slot in self.links.iter_mut() {
            let sweepable = slot.value().as_ref().is_some_and(|r| {
                let expired = cutoff
                    .is_some_and(|cutoff| r.expires_at.is_some_and(|exp| exp < cutoff));
                expired || r.is_consumed()
            });
            if sweepable {
                *slot.value_mut() = None;
                retired += 1;
            }
        }
        Ok(retired)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.len() as u64)
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(code: &str, target: &str) -> LinkRecord {
        LinkRecord::new(code, target, Utc::now())
    }

    #[tokio::test]
    async fn test_create_never_overwrites() {
        let store = MemoryStore::new();
        store.create(record("abc", "https://a.example")).await.unwrap();

        let err = store
            .create(record("abc", "https://b.example"))
            .await
            .unwrap_err();
        assert!(matches!(err, SnaplinkError::Collision(_)));
        assert_eq!(
            store.get("abc").await.unwrap().target,
            "https://a.example"
        );
    }

    #[tokio::test]
    async fn test_update_atomic_bumps_version() {
        let store = MemoryStore::new();
        store.create(record("abc", "https://a.example")).await.unwrap();

        let updated = store
            .update_atomic("abc", &|r: &LinkRecord| {
                let mut next = r.clone();
                next.click_count += 1;
                Ok(next)
            })
            .await
            .unwrap();
        assert_eq!(updated.click_count, 1);
        assert_eq!(updated.version, 1);
    }

    #[tokio::test]
    async fn test_update_atomic_abort_leaves_record_untouched() {
        let store = MemoryStore::new();
        store.create(record("abc", "https://a.example")).await.unwrap();

        let err = store
            .update_atomic("abc", &|_: &LinkRecord| Err(SnaplinkError::denied("no")))
            .await
            .unwrap_err();
        assert!(matches!(err, SnaplinkError::Denied(_)));
        assert_eq!(store.get("abc").await.unwrap().version, 0);
    }

    #[tokio::test]
    async fn test_update_atomic_missing() {
        let store = MemoryStore::new();
        let err = store
            .update_atomic("nope", &|r: &LinkRecord| Ok(r.clone()))
            .await
            .unwrap_err();
        assert!(matches!(err, SnaplinkError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_sweep_policy() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let mut long_expired = record("old", "https://a.example");
        long_expired.expires_at = Some(now - Duration::days(3));
        let mut recently_expired = record("recent", "https://a.example");
        recently_expired.expires_at = Some(now - Duration::hours(1));
        let mut consumed = record("used", "https://a.example");
        consumed.one_time_use = true;
        consumed.active = false;
        consumed.click_count = 1;
        let mut disabled = record("off", "https://a.example");
        disabled.active = false;

        for r in [long_expired, recently_expired, consumed, disabled] {
            store.create(r).await.unwrap();
        }

        let removed = store.sweep(now, Duration::days(1)).await.unwrap();
        assert_eq!(removed, 2);
        assert!(store.get("recent").await.is_ok());
        assert!(store.get("off").await.is_ok());
        assert!(store.get("old").await.is_err());
        assert!(store.get("used").await.is_err());
        assert_eq!(store.len(), 2);

        // 清理后的短码仍被占用
        assert!(matches!(
            store.create(record("old", "https://b.example")).await,
            Err(SnaplinkError::Collision(_))
        ));
        assert_eq!(store.sweep(now, Duration::days(1)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_deleted_code_is_not_reissued() {
        let store = MemoryStore::new();
        store.create(record("abc", "https://a.example")).await.unwrap();
        store.delete("abc").await.unwrap();

        assert!(matches!(store.get("abc").await, Err(SnaplinkError::NotFound(_))));
        assert!(matches!(
            store.create(record("abc", "https://b.example")).await,
            Err(SnaplinkError::Collision(_))
        ));
        assert!(matches!(
            store
                .update_atomic("abc", &|r: &LinkRecord| Ok(r.clone()))
                .await,
            Err(SnaplinkError::NotFound(_))
        ));
        assert!(matches!(store.delete("abc").await, Err(SnaplinkError::NotFound(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_search_and_list_by_owner() {
        let store = MemoryStore::new();
        let mut a = record("a1", "https://example.com/docs");
        a.owner = Some("alice".into());
        let mut b = record("b1", "https://example.com/blog");
        b.owner = Some("bob".into());
        store.create(a).await.unwrap();
        store.create(b).await.unwrap();

        let hits = store
            .search(&SearchQuery {
                text: "example.com".into(),
                exact: false,
                owner: None,
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);

        let hits = store
            .search(&SearchQuery {
                text: "https://example.com/blog".into(),
                exact: true,
                owner: None,
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].code, "b1");

        let alice = store.list_by_owner("alice").await.unwrap();
        assert_eq!(alice.len(), 1);
        assert_eq!(alice[0].code, "a1");
    }
}

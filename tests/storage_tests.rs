//! Link store tests
//!
//! Run against both backends: SeaORM on a temporary SQLite database and the
//! in-memory store.

use std::sync::Arc;

use chrono::{Duration, Utc};
use snaplink::errors::SnaplinkError;
use snaplink::storage::{
    LinkRecord, LinkStore, MemoryStore, SeaOrmStore, SearchQuery, StoreOptions,
};
use tempfile::TempDir;

/// 创建临时 SQLite 数据库的存储实例
async fn create_sqlite_store() -> (Arc<dyn LinkStore>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let store = SeaOrmStore::connect(&db_url, "sqlite", StoreOptions::default())
        .await
        .expect("Failed to create store");

    (Arc::new(store), temp_dir)
}

async fn both_stores() -> Vec<(Arc<dyn LinkStore>, Option<TempDir>)> {
    let (sqlite, dir) = create_sqlite_store().await;
    vec![(sqlite, Some(dir)), (Arc::new(MemoryStore::new()), None)]
}

fn record(code: &str) -> LinkRecord {
    LinkRecord::new(code, format!("https://{}.example.com", code), Utc::now())
}

#[tokio::test]
async fn test_create_get_round_trip() {
    for (store, _dir) in both_stores().await {
        let mut link = record("round1");
        link.expires_at = Some(Utc::now() + Duration::days(30));
        link.password_hash = Some("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into());
        link.one_time_use = true;
        link.owner = Some("alice".into());

        let created = store.create(link.clone()).await.unwrap();
        let fetched = store.get("round1").await.unwrap();

        assert_eq!(fetched.code, link.code, "{}", store.backend_name());
        assert_eq!(fetched.target, link.target);
        assert_eq!(fetched.password_hash, link.password_hash);
        assert_eq!(fetched.one_time_use, link.one_time_use);
        assert_eq!(fetched.owner, link.owner);
        assert_eq!(fetched.click_count, 0);
        assert!(fetched.active);
        // 时间戳按秒比较（数据库精度可能不同）
        assert_eq!(
            fetched.expires_at.map(|t| t.timestamp()),
            link.expires_at.map(|t| t.timestamp())
        );
        assert_eq!(created.code, fetched.code);
    }
}

#[tokio::test]
async fn test_get_missing_is_not_found() {
    for (store, _dir) in both_stores().await {
        assert!(matches!(
            store.get("missing").await,
            Err(SnaplinkError::NotFound(_))
        ));
    }
}

#[tokio::test]
async fn test_create_existing_code_is_collision() {
    for (store, _dir) in both_stores().await {
        store.create(record("dup")).await.unwrap();

        let mut other = record("dup");
        other.target = "https://other.example.com".into();
        assert!(matches!(
            store.create(other).await,
            Err(SnaplinkError::Collision(_))
        ));

        // 原记录不被覆盖
        assert_eq!(
            store.get("dup").await.unwrap().target,
            "https://dup.example.com"
        );
    }
}

#[tokio::test]
async fn test_concurrent_create_same_code_single_winner() {
    for (store, _dir) in both_stores().await {
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let mut link = record("race");
                link.target = format!("https://writer{}.example.com", i);
                store.create(link).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(SnaplinkError::Collision(_)) => {}
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!(successes, 1, "{}", store.backend_name());
    }
}

#[tokio::test]
async fn test_update_atomic_applies_and_bumps_version() {
    for (store, _dir) in both_stores().await {
        store.create(record("cas")).await.unwrap();

        let updated = store
            .update_atomic("cas", &|current: &LinkRecord| {
                let mut next = current.clone();
                next.click_count += 1;
                Ok(next)
            })
            .await
            .unwrap();
        assert_eq!(updated.click_count, 1);
        assert_eq!(updated.version, 1);
        assert_eq!(store.get("cas").await.unwrap().click_count, 1);
    }
}

#[tokio::test]
async fn test_update_atomic_abort_writes_nothing() {
    for (store, _dir) in both_stores().await {
        store.create(record("abort")).await.unwrap();

        let result = store
            .update_atomic("abort", &|_: &LinkRecord| {
                Err(SnaplinkError::expired("stop"))
            })
            .await;
        assert!(matches!(result, Err(SnaplinkError::Expired(_))));

        let fetched = store.get("abort").await.unwrap();
        assert_eq!(fetched.version, 0);
        assert_eq!(fetched.click_count, 0);
    }
}

#[tokio::test]
async fn test_concurrent_increments_are_not_lost() {
    for (store, _dir) in both_stores().await {
        store.create(record("counter")).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update_atomic("counter", &|current: &LinkRecord| {
                        let mut next = current.clone();
                        next.click_count += 1;
                        Ok(next)
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(
            store.get("counter").await.unwrap().click_count,
            10,
            "{}",
            store.backend_name()
        );
    }
}

#[tokio::test]
async fn test_delete() {
    for (store, _dir) in both_stores().await {
        store.create(record("gone")).await.unwrap();
        store.delete("gone").await.unwrap();
        assert!(matches!(
            store.get("gone").await,
            Err(SnaplinkError::NotFound(_))
        ));
        assert!(matches!(
            store.delete("gone").await,
            Err(SnaplinkError::NotFound(_))
        ));
    }
}

#[tokio::test]
async fn test_deleted_code_stays_reserved() {
    for (store, _dir) in both_stores().await {
        store.create(record("promo")).await.unwrap();
        store.delete("promo").await.unwrap();

        let mut reuse = record("promo");
        reuse.target = "https://elsewhere.example.com".into();
        assert!(
            matches!(store.create(reuse).await, Err(SnaplinkError::Collision(_))),
            "{}",
            store.backend_name()
        );
        assert!(matches!(
            store.get("promo").await,
            Err(SnaplinkError::NotFound(_))
        ));
        assert!(matches!(
            store
                .update_atomic("promo", &|current: &LinkRecord| Ok(current.clone()))
                .await,
            Err(SnaplinkError::NotFound(_))
        ));
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(
            store
                .search(&SearchQuery {
                    text: String::new(),
                    exact: false,
                    owner: None,
                    limit: 10,
                })
                .await
                .unwrap()
                .is_empty()
        );
    }
}

#[tokio::test]
async fn test_sweep_policy() {
    for (store, _dir) in both_stores().await {
        let now = Utc::now();

        let mut long_expired = record("long-expired");
        long_expired.expires_at = Some(now - Duration::days(3));
        let mut recently_expired = record("recent-expired");
        recently_expired.expires_at = Some(now - Duration::minutes(5));
        let mut consumed = record("consumed");
        consumed.one_time_use = true;
        let mut disabled = record("disabled");
        disabled.active = false;

        for link in [
            long_expired,
            recently_expired,
            consumed,
            disabled,
            record("live"),
        ] {
            store.create(link).await.unwrap();
        }

        // 一次性链接被访问后失效
        store
            .update_atomic("consumed", &|current: &LinkRecord| {
                let mut next = current.clone();
                next.click_count += 1;
                next.active = false;
                Ok(next)
            })
            .await
            .unwrap();

        let removed = store.sweep(now, Duration::days(1)).await.unwrap();
        assert_eq!(removed, 2, "{}", store.backend_name());

        assert!(store.get("long-expired").await.is_err());
        assert!(store.get("consumed").await.is_err());
        assert!(store.get("recent-expired").await.is_ok());
        assert!(store.get("disabled").await.is_ok());
        assert!(store.get("live").await.is_ok());
        assert_eq!(store.count().await.unwrap(), 3);

        // 清理掉的短码不能再签发，重复清理不重复计数
        assert!(matches!(
            store.create(record("consumed")).await,
            Err(SnaplinkError::Collision(_))
        ));
        assert_eq!(store.sweep(now, Duration::days(1)).await.unwrap(), 0);
    }
}

#[tokio::test]
async fn test_sweep_with_huge_grace_keeps_everything() {
    for (store, _dir) in both_stores().await {
        let mut expired = record("old");
        expired.expires_at = Some(Utc::now() - Duration::days(3));
        store.create(expired).await.unwrap();

        let removed = store.sweep(Utc::now(), Duration::MAX).await.unwrap();
        assert_eq!(removed, 0, "{}", store.backend_name());
        assert!(store.get("old").await.is_ok());
    }
}

#[tokio::test]
async fn test_search_and_list_by_owner() {
    for (store, _dir) in both_stores().await {
        let mut a = LinkRecord::new("a1", "https://docs.example.com/guide", Utc::now());
        a.owner = Some("alice".into());
        let mut b = LinkRecord::new("b1", "https://blog.example.com/post", Utc::now());
        b.owner = Some("bob".into());
        let mut c = LinkRecord::new("a2", "https://docs.example.com/api", Utc::now());
        c.owner = Some("alice".into());
        for link in [a, b, c] {
            store.create(link).await.unwrap();
        }

        let alice = store.list_by_owner("alice").await.unwrap();
        assert_eq!(alice.len(), 2);

        let docs = store
            .search(&SearchQuery {
                text: "docs.example".into(),
                exact: false,
                owner: None,
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(docs.len(), 2);

        let exact = store
            .search(&SearchQuery {
                text: "https://blog.example.com/post".into(),
                exact: true,
                owner: None,
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].code, "b1");

        let limited = store
            .search(&SearchQuery {
                text: "example".into(),
                exact: false,
                owner: Some("alice".into()),
                limit: 1,
            })
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].owner.as_deref(), Some("alice"));
    }
}

#[tokio::test]
async fn test_search_is_literal_and_case_sensitive() {
    for (store, _dir) in both_stores().await {
        store
            .create(LinkRecord::new("w1", "https://example.com/aXb", Utc::now()))
            .await
            .unwrap();
        store
            .create(LinkRecord::new("w2", "https://example.com/100pct", Utc::now()))
            .await
            .unwrap();
        store
            .create(LinkRecord::new("w3", "https://example.com/50%_off", Utc::now()))
            .await
            .unwrap();

        let search = |text: &str, exact: bool| SearchQuery {
            text: text.into(),
            exact,
            owner: None,
            limit: 10,
        };
        let codes = |hits: Vec<LinkRecord>| hits.into_iter().map(|r| r.code).collect::<Vec<_>>();

        // `_` 与 `%` 不是通配符
        assert!(
            store.search(&search("a_b", false)).await.unwrap().is_empty(),
            "{}",
            store.backend_name()
        );
        assert_eq!(codes(store.search(&search("%", false)).await.unwrap()), ["w3"]);
        assert_eq!(codes(store.search(&search("%_off", false)).await.unwrap()), ["w3"]);

        // 大小写敏感
        assert!(store.search(&search("AXB", false)).await.unwrap().is_empty());
        assert_eq!(codes(store.search(&search("aXb", false)).await.unwrap()), ["w1"]);
        assert!(
            store
                .search(&search("https://EXAMPLE.com/aXb", true))
                .await
                .unwrap()
                .is_empty()
        );
    }
}

#[tokio::test]
async fn test_health_check() {
    for (store, _dir) in both_stores().await {
        store.health_check().await.unwrap();
    }
}

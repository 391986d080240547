use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::StaticConfig;
use crate::errors::Result;

pub mod backend;
mod deadline;
pub mod memory;
pub mod models;

pub use backend::{SeaOrmStore, StoreOptions};
pub use deadline::DeadlineStore;
pub use memory::MemoryStore;
pub use models::{LinkRecord, LinkStatus, SearchQuery};

/// 传给 [`LinkStore::update_atomic`] 的变换函数
///
/// 返回 `Err` 时中止更新，错误原样返回给调用者。
/// 可能因 CAS 冲突被多次调用，必须无副作用。
pub type Mutation<'a> = dyn Fn(&LinkRecord) -> Result<LinkRecord> + Send + Sync + 'a;

/// 短链存储
///
/// 同一短码上的并发操作只通过这里的原语线性化。
/// 短码终身唯一：删除与清理留下墓碑，`get` 对墓碑返回 `NotFound`，
/// `create` 对墓碑返回 `Collision`。
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// 原子的条件插入；短码已存在时返回 `Collision`，绝不覆盖
    async fn create(&self, record: LinkRecord) -> Result<LinkRecord>;

    async fn get(&self, code: &str) -> Result<LinkRecord>;

    /// 读取、应用 `mutation`、按版本号条件写回
    ///
    /// `code`、`created_at` 保持不变，`version` 由存储层递增。
    async fn update_atomic(&self, code: &str, mutation: &Mutation<'_>) -> Result<LinkRecord>;

    /// 改写为墓碑；不存在或已是墓碑时返回 `NotFound`
    async fn delete(&self, code: &str) -> Result<()>;

    /// 按创建时间倒序
    async fn list_by_owner(&self, owner: &str) -> Result<Vec<LinkRecord>>;

    async fn search(&self, query: &SearchQuery) -> Result<Vec<LinkRecord>>;

    /// 将过期超过 `grace` 的记录以及已消费的一次性记录改写为墓碑，返回数量
    async fn sweep(&self, now: DateTime<Utc>, grace: chrono::Duration) -> Result<u64>;

    /// 存活记录数，不含墓碑
    async fn count(&self) -> Result<u64>;

    async fn health_check(&self) -> Result<()>;

    fn backend_name(&self) -> &str;
}

pub struct StorageFactory;

impl StorageFactory {
    /// 根据配置创建存储，统一包上调用截止时间
    pub async fn create(config: &StaticConfig) -> Result<Arc<dyn LinkStore>> {
        let database_url = &config.database.database_url;
        let timeout = Duration::from_millis(config.store.timeout_ms);

        if database_url.starts_with("memory://") {
            info!("Using in-memory link store");
            let store = MemoryStore::new();
            return Ok(Arc::new(DeadlineStore::new(store, timeout)));
        }

        // 从 URL 自动推断数据库类型
        let backend_type = backend::infer_backend_from_url(database_url)?;
        let options = StoreOptions::from_config(config);
        let store = SeaOrmStore::connect(database_url, &backend_type, options).await?;
        Ok(Arc::new(DeadlineStore::new(store, timeout)))
    }
}

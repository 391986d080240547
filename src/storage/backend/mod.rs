//! SeaORM storage backend
//!
//! SQLite, MySQL/MariaDB and PostgreSQL through SeaORM. The schema lives in
//! the `migration` workspace crate and is applied on connect.

mod connection;
mod converters;
mod mutations;
mod query;
pub mod retry;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use tracing::warn;

use crate::config::StaticConfig;
use crate::errors::{Result, SnaplinkError};
use crate::storage::{LinkRecord, LinkStore, Mutation, SearchQuery};

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use converters::{model_to_record, record_to_insert_model, record_to_update_model};
pub use retry::RetryConfig;

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(SnaplinkError::database_config(format!(
            "Cannot infer database type from URL: {}. Supported: sqlite://, mysql://, mariadb://, postgres://, memory://",
            database_url
        )))
    }
}

/// SeaOrmStore 连接参数
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    pub retry: RetryConfig,
    pub cas_max_attempts: u32,
    pub pool_size: u32,
    pub connect_timeout_secs: u64,
}

impl StoreOptions {
    pub fn from_config(config: &StaticConfig) -> Self {
        Self {
            retry: RetryConfig::from_config(&config.database),
            cas_max_attempts: config.store.cas_max_attempts.max(1),
            pool_size: config.database.pool_size,
            connect_timeout_secs: config.database.timeout,
        }
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            cas_max_attempts: 32,
            pool_size: 10,
            connect_timeout_secs: 8,
        }
    }
}

/// SeaORM-based link store
#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
    backend_name: String,
    options: StoreOptions,
}

impl SeaOrmStore {
    pub async fn connect(
        database_url: &str,
        backend_name: &str,
        options: StoreOptions,
    ) -> Result<Self> {
        if database_url.is_empty() {
            return Err(SnaplinkError::database_config("database_url is not set"));
        }

        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url).await?
        } else {
            connect_generic(
                database_url,
                backend_name,
                options.pool_size,
                options.connect_timeout_secs,
            )
            .await?
        };

        let store = SeaOrmStore {
            db,
            backend_name: backend_name.to_string(),
            options,
        };

        run_migrations(&store.db).await?;

        warn!("{} link store initialized.", store.backend_name.to_uppercase());
        Ok(store)
    }
}

#[async_trait]
impl LinkStore for SeaOrmStore {
    async fn create(&self, record: LinkRecord) -> Result<LinkRecord> {
        self.insert_if_absent(record).await
    }

    async fn get(&self, code: &str) -> Result<LinkRecord> {
        self.find(code)
            .await?
            .ok_or_else(|| SnaplinkError::not_found(format!("link '{}' not found", code)))
    }

    async fn update_atomic(&self, code: &str, mutation: &Mutation<'_>) -> Result<LinkRecord> {
        self.compare_and_swap(code, mutation).await
    }

    async fn delete(&self, code: &str) -> Result<()> {
        self.remove(code).await
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<LinkRecord>> {
        self.find_by_owner(owner).await
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<LinkRecord>> {
        self.find_matching(query).await
    }

    async fn sweep(&self, now: DateTime<Utc>, grace: chrono::Duration) -> Result<u64> {
        self.retire_swept(now, grace).await
    }

    async fn count(&self) -> Result<u64> {
        self.count_all().await
    }

    async fn health_check(&self) -> Result<()> {
        self.db
            .ping()
            .await
            .map_err(|e| SnaplinkError::unavailable(format!("database ping failed: {}", e)))
    }

    fn backend_name(&self) -> &str {
        &self.backend_name
    }
}

//! Read-only operations for SeaOrmStore
//!
//! Tombstoned rows are invisible to every read.

use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseBackend, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
    sea_query::{Expr, SimpleExpr},
};

use super::SeaOrmStore;
use super::converters::model_to_record;
use super::retry;
use crate::errors::Result;
use crate::storage::{LinkRecord, SearchQuery};

use migration::entities::short_link;

/// 区分大小写的字面子串匹配
///
/// 不走 LIKE：`%`、`_` 不应被当作通配符，SQLite 的 LIKE 也不区分 ASCII 大小写。
/// MySQL 上 target_url 列为 utf8mb4_bin，INSTR 按字节比较。
fn target_contains(backend: DatabaseBackend, text: &str) -> SimpleExpr {
    match backend {
        DatabaseBackend::Postgres => {
            Expr::cust_with_values("strpos(target_url, ?) > 0", [text.to_string()])
        }
        _ => Expr::cust_with_values("instr(target_url, ?) > 0", [text.to_string()]),
    }
}

impl SeaOrmStore {
    pub(super) async fn find(&self, code: &str) -> Result<Option<LinkRecord>> {
        let db = &self.db;

        let model = retry::with_retry(&format!("get({})", code), self.options.retry, || async {
            short_link::Entity::find_by_id(code)
                .filter(short_link::Column::Deleted.eq(false))
                .one(db)
                .await
        })
        .await?;

        Ok(model.map(model_to_record))
    }

    pub(super) async fn find_by_owner(&self, owner: &str) -> Result<Vec<LinkRecord>> {
        let db = &self.db;

        let models = retry::with_retry(
            &format!("list_by_owner({})", owner),
            self.options.retry,
            || async {
                short_link::Entity::find()
                    .filter(short_link::Column::Owner.eq(owner))
                    .filter(short_link::Column::Deleted.eq(false))
                    .order_by_desc(short_link::Column::CreatedAt)
                    .all(db)
                    .await
            },
        )
        .await?;

        Ok(models.into_iter().map(model_to_record).collect())
    }

    pub(super) async fn find_matching(&self, query: &SearchQuery) -> Result<Vec<LinkRecord>> {
        let db = &self.db;

        let mut condition = Condition::all().add(short_link::Column::Deleted.eq(false));
        if query.exact {
            condition = condition.add(short_link::Column::TargetUrl.eq(query.text.as_str()));
        } else if !query.text.is_empty() {
            condition = condition.add(target_contains(db.get_database_backend(), &query.text));
        }
        if let Some(ref owner) = query.owner {
            condition = condition.add(short_link::Column::Owner.eq(owner.as_str()));
        }

        let models = retry::with_retry("search", self.options.retry, || async {
            short_link::Entity::find()
                .filter(condition.clone())
                .order_by_desc(short_link::Column::CreatedAt)
                .limit(query.limit as u64)
                .all(db)
                .await
        })
        .await?;

        Ok(models.into_iter().map(model_to_record).collect())
    }

    pub(super) async fn count_all(&self) -> Result<u64> {
        let db = &self.db;
        retry::with_retry("count", self.options.retry, || async {
            short_link::Entity::find()
                .filter(short_link::Column::Deleted.eq(false))
                .count(db)
                .await
        })
        .await
    }
}

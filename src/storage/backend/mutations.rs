//! Write operations for SeaOrmStore

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, ExprTrait, QueryFilter, UpdateMany,
    sea_query::{Expr, OnConflict},
};
use tracing::{debug, info, warn};

use super::SeaOrmStore;
use super::converters::{record_to_insert_model, record_to_update_model};
use super::retry;
use crate::errors::{Result, SnaplinkError};
use crate::storage::{LinkRecord, Mutation};

use migration::entities::short_link;

/// 将匹配的行改写为墓碑：主键保留，目标与密码清空，版本递增使进行中的 CAS 失败
fn retire(update: UpdateMany<short_link::Entity>) -> UpdateMany<short_link::Entity> {
    update
        .col_expr(short_link::Column::Deleted, Expr::value(true))
        .col_expr(short_link::Column::Active, Expr::value(false))
        .col_expr(short_link::Column::TargetUrl, Expr::value(""))
        .col_expr(short_link::Column::PasswordHash, Expr::value(Option::<String>::None))
        .col_expr(short_link::Column::Owner, Expr::value(Option::<String>::None))
        .col_expr(
            short_link::Column::Version,
            Expr::col(short_link::Column::Version).add(1i64),
        )
        .filter(short_link::Column::Deleted.eq(false))
}

impl SeaOrmStore {
    /// `INSERT .. ON CONFLICT DO NOTHING`，受影响行数为 0 即冲突（墓碑行同样占用短码）
    pub(super) async fn insert_if_absent(&self, mut record: LinkRecord) -> Result<LinkRecord> {
        record.version = 0;
        let db = &self.db;

        let inserted = retry::with_write_retry(
            &format!("create({})", record.code),
            self.options.retry,
            || async {
                short_link::Entity::insert(record_to_insert_model(&record))
                    .on_conflict(
                        OnConflict::column(short_link::Column::ShortCode)
                            .do_nothing()
                            .to_owned(),
                    )
                    .exec_without_returning(db)
                    .await
            },
        )
        .await?;

        if inserted == 0 {
            return Err(SnaplinkError::collision(format!(
                "code '{}' already exists",
                record.code
            )));
        }

        debug!("Short link inserted: {}", record.code);
        Ok(record)
    }

    /// 乐观并发更新：`UPDATE .. WHERE short_code = ? AND version = ?`
    pub(super) async fn compare_and_swap(
        &self,
        code: &str,
        mutation: &Mutation<'_>,
    ) -> Result<LinkRecord> {
        let db = &self.db;

        for attempt in 1..=self.options.cas_max_attempts {
            let current = self
                .find(code)
                .await?
                .ok_or_else(|| SnaplinkError::not_found(format!("link '{}' not found", code)))?;

            let mut next = mutation(&current)?;
            next.code = current.code.clone();
            next.created_at = current.created_at;
            next.version = current.version + 1;

            let expected_version = current.version as i64;
            let updated = retry::with_write_retry(
                &format!("update_atomic({})", code),
                self.options.retry,
                || async {
                    short_link::Entity::update_many()
                        .set(record_to_update_model(&next))
                        .filter(short_link::Column::ShortCode.eq(code))
                        .filter(short_link::Column::Version.eq(expected_version))
                        .exec(db)
                        .await
                },
            )
            .await?;

            if updated.rows_affected == 1 {
                return Ok(next);
            }

            debug!(
                "CAS conflict on '{}' at version {} (attempt {}/{})",
                code, current.version, attempt, self.options.cas_max_attempts
            );
        }

        warn!(
            "update_atomic({}) gave up after {} conflicting attempts",
            code, self.options.cas_max_attempts
        );
        Err(SnaplinkError::unavailable(format!(
            "too much contention updating '{}'",
            code
        )))
    }

    pub(super) async fn remove(&self, code: &str) -> Result<()> {
        let db = &self.db;

        let result = retry::with_write_retry(
            &format!("delete({})", code),
            self.options.retry,
            || async {
                retire(short_link::Entity::update_many())
                    .filter(short_link::Column::ShortCode.eq(code))
                    .exec(db)
                    .await
            },
        )
        .await?;

        if result.rows_affected == 0 {
            return Err(SnaplinkError::not_found(format!(
                "link '{}' not found",
                code
            )));
        }

        info!("Short link deleted: {}", code);
        Ok(())
    }

    /// 过期超过宽限期的记录 + 已消费的一次性记录，改写为墓碑
    pub(super) async fn retire_swept(
        &self,
        now: DateTime<Utc>,
        grace: chrono::Duration,
    ) -> Result<u64> {
        let db = &self.db;
        let mut condition = Condition::any().add(
            Condition::all()
                .add(short_link::Column::OneTimeUse.eq(true))
                .add(short_link::Column::Active.eq(false))
                .add(short_link::Column::ClickCount.gt(0)),
        );
        // 宽限期超出时间范围时没有记录算作过期
        if let Some(cutoff) = now.checked_sub_signed(grace) {
            condition = condition.add(
                Condition::all()
                    .add(short_link::Column::ExpiresAt.is_not_null())
                    .add(short_link::Column::ExpiresAt.lt(cutoff)),
            );
        }

        // 重复执行只会命中尚未改写的行，可以安全重试
        let result = retry::with_retry("sweep", self.options.retry, || async {
            retire(short_link::Entity::update_many())
                .filter(condition.clone())
                .exec(db)
                .await
        })
        .await?;

        Ok(result.rows_affected)
    }
}

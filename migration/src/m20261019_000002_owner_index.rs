use sea_orm_migration::prelude::*;

use crate::m20261019_000001_create_links::ShortLink;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // (owner, created_at) 复合索引，用于 "我的链接" 列表按时间倒序
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_owner_created")
                    .table(ShortLink::Table)
                    .col(ShortLink::Owner)
                    .col(ShortLink::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // (active, one_time_use) 索引，GC 扫描已消费的一次性链接
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_active_one_time")
                    .table(ShortLink::Table)
                    .col(ShortLink::Active)
                    .col(ShortLink::OneTimeUse)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .if_exists()
                    .name("idx_active_one_time")
                    .table(ShortLink::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .if_exists()
                    .name("idx_owner_created")
                    .table(ShortLink::Table)
                    .to_owned(),
            )
            .await
    }
}

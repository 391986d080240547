use sea_orm::DatabaseBackend;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut short_code = ColumnDef::new(ShortLink::ShortCode);
        short_code.string_len(64).not_null().primary_key();
        let mut target_url = ColumnDef::new(ShortLink::TargetUrl);
        target_url.text().not_null();

        // MySQL 默认排序规则不区分大小写，短码和目标地址都需按字节比较
        if manager.get_database_backend() == DatabaseBackend::MySql {
            short_code.extra("COLLATE utf8mb4_bin");
            target_url.extra("COLLATE utf8mb4_bin");
        }

        // 创建 short_links 表
        manager
            .create_table(
                Table::create()
                    .table(ShortLink::Table)
                    .if_not_exists()
                    .col(short_code)
                    .col(target_url)
                    .col(
                        ColumnDef::new(ShortLink::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShortLink::ExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ShortLink::PasswordHash).string().null())
                    .col(
                        ColumnDef::new(ShortLink::OneTimeUse)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ShortLink::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ShortLink::ClickCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(ShortLink::Owner).string().null())
                    .col(
                        ColumnDef::new(ShortLink::Version)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    // 删除和清理只留下墓碑行，短码永不复用
                    .col(
                        ColumnDef::new(ShortLink::Deleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        // 过期时间索引（GC 扫描使用）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_expires_at")
                    .table(ShortLink::Table)
                    .col(ShortLink::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_created_at")
                    .table(ShortLink::Table)
                    .col(ShortLink::CreatedAt)
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
                    .name("idx_created_at")
                    .table(ShortLink::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .if_exists()
                    .name("idx_expires_at")
                    .table(ShortLink::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(ShortLink::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum ShortLink {
    #[sea_orm(iden = "short_links")]
    Table,
    ShortCode,
    TargetUrl,
    CreatedAt,
    ExpiresAt,
    PasswordHash,
    OneTimeUse,
    Active,
    ClickCount,
    Owner,
    Version,
    Deleted,
}

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "short_links")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub short_code: String,
    #[sea_orm(column_type = "Text")]
    pub target_url: String,
    pub created_at: DateTimeUtc,
    pub expires_at: Option<DateTimeUtc>,
    /// Argon2id PHC string
    pub password_hash: Option<String>,
    pub one_time_use: bool,
    pub active: bool,
    pub click_count: i64,
    pub owner: Option<String>,
    /// CAS token, bumped by every successful update
    pub version: i64,
    /// Tombstone; the code stays reserved after delete or sweep
    pub deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

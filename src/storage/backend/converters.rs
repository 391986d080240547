use crate::storage::LinkRecord;
use migration::entities::short_link;

/// 将 Sea-ORM Model 转换为 LinkRecord
pub fn model_to_record(model: short_link::Model) -> LinkRecord {
    LinkRecord {
        code: model.short_code,
        target: model.target_url,
        created_at: model.created_at,
        expires_at: model.expires_at,
        password_hash: model.password_hash,
        one_time_use: model.one_time_use,
        active: model.active,
        click_count: model.click_count.max(0) as u64,
        owner: model.owner,
        version: model.version.max(0) as u64,
    }
}

/// 插入用：所有列都写入
pub fn record_to_insert_model(record: &LinkRecord) -> short_link::ActiveModel {
    use sea_orm::ActiveValue::Set;

    short_link::ActiveModel {
        short_code: Set(record.code.clone()),
        target_url: Set(record.target.clone()),
        created_at: Set(record.created_at),
        expires_at: Set(record.expires_at),
        password_hash: Set(record.password_hash.clone()),
        one_time_use: Set(record.one_time_use),
        active: Set(record.active),
        click_count: Set(record.click_count as i64),
        owner: Set(record.owner.clone()),
        version: Set(record.version as i64),
        deleted: Set(false),
    }
}

/// 更新用：主键、创建时间和墓碑标记不参与 SET
pub fn record_to_update_model(record: &LinkRecord) -> short_link::ActiveModel {
    use sea_orm::ActiveValue::NotSet;

    short_link::ActiveModel {
        short_code: NotSet,
        created_at: NotSet,
        deleted: NotSet,
        ..record_to_insert_model(record)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 持久化的短链记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    pub code: String,
    pub target: String,
    pub created_at: DateTime<Utc>,
    /// `None` 表示永不过期
    pub expires_at: Option<DateTime<Utc>>,
    /// Argon2id PHC 字符串
    pub password_hash: Option<String>,
    pub one_time_use: bool,
    pub active: bool,
    pub click_count: u64,
    pub owner: Option<String>,
    /// 每次成功写入后由存储层递增
    pub version: u64,
}

impl LinkRecord {
    pub fn new(code: impl Into<String>, target: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            code: code.into(),
            target: target.into(),
            created_at,
            expires_at: None,
            password_hash: None,
            one_time_use: false,
            active: true,
            click_count: 0,
            owner: None,
            version: 0,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    /// 一次性链接已被使用
    pub fn is_consumed(&self) -> bool {
        self.one_time_use && !self.active && self.click_count > 0
    }

    pub fn is_password_protected(&self) -> bool {
        self.password_hash.is_some()
    }

    /// 当前可被解析（不考虑密码）
    pub fn is_resolvable_at(&self, now: DateTime<Utc>) -> bool {
        self.active && !self.is_expired_at(now)
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> LinkStatus {
        if self.is_consumed() {
            LinkStatus::Consumed
        } else if !self.active {
            LinkStatus::Disabled
        } else if self.is_expired_at(now) {
            LinkStatus::Expired
        } else {
            LinkStatus::Active
        }
    }
}

/// 对外展示的派生状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Active,
    Expired,
    Disabled,
    Consumed,
}

/// 目标地址搜索条件
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub text: String,
    /// true 时完全匹配 target，否则子串匹配
    pub exact: bool,
    pub owner: Option<String>,
    pub limit: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let now = Utc::now();
        let mut record = LinkRecord::new("abc", "https://example.com", now - Duration::days(1));
        record.expires_at = Some(now);
        assert!(record.is_expired_at(now));
        assert!(!record.is_expired_at(now - Duration::seconds(1)));
    }

    #[test]
    fn test_status_derivation() {
        let now = Utc::now();
        let mut record = LinkRecord::new("abc", "https://example.com", now);
        assert_eq!(record.status_at(now), LinkStatus::Active);

        record.expires_at = Some(now - Duration::seconds(1));
        assert_eq!(record.status_at(now), LinkStatus::Expired);

        record.active = false;
        assert_eq!(record.status_at(now), LinkStatus::Disabled);

        record.one_time_use = true;
        record.click_count = 1;
        assert_eq!(record.status_at(now), LinkStatus::Consumed);
        assert!(!record.is_resolvable_at(now));
    }

    #[test]
    fn test_one_time_link_not_consumed_before_first_click() {
        let now = Utc::now();
        let mut record = LinkRecord::new("abc", "https://example.com", now);
        record.one_time_use = true;
        record.active = false;
        assert!(!record.is_consumed());
        assert_eq!(record.status_at(now), LinkStatus::Disabled);
    }
}

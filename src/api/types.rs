//! HTTP 请求与响应类型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::{CreateLinkRequest, ExtendRequest, IssuedLink, SearchRequest};
use crate::storage::{LinkRecord, LinkStatus};

/// 统一 JSON 信封
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PostNewLink {
    pub url: String,
    pub expires_at: Option<String>,
    pub password: Option<String>,
    pub one_time: Option<bool>,
    pub code: Option<String>,
    pub owner: Option<String>,
}

impl From<PostNewLink> for CreateLinkRequest {
    fn from(body: PostNewLink) -> Self {
        CreateLinkRequest {
            url: body.url,
            expires_at: body.expires_at,
            password: body.password,
            one_time: body.one_time.unwrap_or(false),
            code: body.code,
            owner: body.owner,
        }
    }
}

/// 签发结果
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct IssueResponse {
    pub code: String,
    pub short_url: String,
    pub target: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub one_time: bool,
}

impl From<IssuedLink> for IssueResponse {
    fn from(issued: IssuedLink) -> Self {
        Self {
            code: issued.record.code,
            short_url: issued.short_url,
            target: issued.record.target,
            expires_at: issued.record.expires_at,
            one_time: issued.record.one_time_use,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SearchBody {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub exact: bool,
    pub owner: Option<String>,
    pub limit: Option<usize>,
}

impl From<SearchBody> for SearchRequest {
    fn from(body: SearchBody) -> Self {
        SearchRequest {
            query: body.query,
            exact: body.exact,
            owner: body.owner,
            limit: body.limit,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ExtendBody {
    pub expires_at: Option<String>,
    pub days: Option<u32>,
}

impl From<ExtendBody> for ExtendRequest {
    fn from(body: ExtendBody) -> Self {
        ExtendRequest {
            expires_at: body.expires_at,
            days: body.days,
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct OwnerQuery {
    pub owner: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct RedirectQuery {
    pub password: Option<String>,
}

/// 脱敏后的链接视图，不含密码哈希
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LinkView {
    pub code: String,
    pub short_url: String,
    pub target: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub password_protected: bool,
    pub one_time: bool,
    pub active: bool,
    pub status: LinkStatus,
    pub click_count: u64,
    pub owner: Option<String>,
}

impl LinkView {
    pub fn from_record(record: LinkRecord, short_url: String, now: DateTime<Utc>) -> Self {
        Self {
            status: record.status_at(now),
            password_protected: record.is_password_protected(),
            code: record.code,
            short_url,
            target: record.target,
            created_at: record.created_at,
            expires_at: record.expires_at,
            one_time: record.one_time_use,
            active: record.active,
            click_count: record.click_count,
            owner: record.owner,
        }
    }
}

/// 批量 JSON 请求体；行保持原样，逐行解码
#[derive(Deserialize, Clone, Debug)]
pub struct BulkJsonBody {
    pub rows: Vec<serde_json::Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SweepResponse {
    pub removed: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthStoreCheck {
    pub status: String,
    pub backend: String,
    pub links_count: Option<u64>,
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub uptime: u64,
    pub uptime_human: String,
    pub store: HealthStoreCheck,
    pub cache_entries: u64,
    pub response_time_ms: u64,
}

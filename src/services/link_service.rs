//! Link issuance and management
//!
//! Shared by the HTTP handlers, the bulk processor and the CLI.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{error, info};

use super::code_generator::{CodeGenerator, validate_custom_code};
use crate::cache::ReadThroughCache;
use crate::config::StaticConfig;
use crate::errors::{Result, SnaplinkError};
use crate::storage::{LinkRecord, LinkStore, SearchQuery};
use crate::utils::TimeParser;
use crate::utils::password::hash_password_blocking;
use crate::utils::url_validator::validate_url;

// ============ Request/Response DTOs ============

/// Request to issue a new link
#[derive(Debug, Clone, Default)]
pub struct CreateLinkRequest {
    /// Target URL
    pub url: String,
    /// Expiration time (flexible format: RFC3339, relative like "30d", "1h30m")
    pub expires_at: Option<String>,
    /// Plaintext password; hashed before storage
    pub password: Option<String>,
    pub one_time: bool,
    /// Custom short code (generated when absent)
    pub code: Option<String>,
    pub owner: Option<String>,
}

/// Result of link issuance
#[derive(Debug, Clone)]
pub struct IssuedLink {
    pub record: LinkRecord,
    pub short_url: String,
    /// Whether the code was auto-generated
    pub generated_code: bool,
}

/// Request to extend a link's expiry
#[derive(Debug, Clone, Default)]
pub struct ExtendRequest {
    /// Absolute or relative new expiry
    pub expires_at: Option<String>,
    /// Days added to max(current expiry, now)
    pub days: Option<u32>,
}

/// Search request; `limit` is clamped to the configured maximum
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: String,
    pub exact: bool,
    pub owner: Option<String>,
    pub limit: Option<usize>,
}

/// Settings taken from `[links]`
#[derive(Debug, Clone)]
pub struct LinkSettings {
    pub base_url: String,
    pub default_expiry: Option<Duration>,
    pub search_limit: usize,
    pub max_search_limit: usize,
}

impl LinkSettings {
    pub fn from_config(config: &StaticConfig) -> Result<Self> {
        let default_expiry = match config.links.default_expiry.as_deref() {
            Some(s) if !s.trim().is_empty() => Some(
                TimeParser::parse_duration(s)
                    .map_err(|e| SnaplinkError::validation(format!("links.default_expiry: {}", e)))?,
            ),
            _ => None,
        };
        Ok(Self {
            base_url: config.links.base_url.clone(),
            default_expiry,
            search_limit: config.links.search_limit.max(1),
            max_search_limit: config.links.max_search_limit.max(1),
        })
    }
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            default_expiry: None,
            search_limit: 20,
            max_search_limit: 200,
        }
    }
}

// ============ LinkService Implementation ============

pub struct LinkService {
    store: Arc<dyn LinkStore>,
    cache: ReadThroughCache,
    generator: CodeGenerator,
    settings: LinkSettings,
}

impl LinkService {
    pub fn new(
        store: Arc<dyn LinkStore>,
        cache: ReadThroughCache,
        generator: CodeGenerator,
        settings: LinkSettings,
    ) -> Self {
        Self {
            store,
            cache,
            generator,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn LinkStore> {
        &self.store
    }

    pub fn cache(&self) -> &ReadThroughCache {
        &self.cache
    }

    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), code)
    }

    /// 显式过期时间优先，否则使用默认过期；必须晚于 `now`
    fn resolve_expiry(
        &self,
        input: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>> {
        let expires_at = match input {
            Some(s) if !s.trim().is_empty() => Some(
                TimeParser::parse_expire_time_at(s, now)
                    .map_err(|e| SnaplinkError::validation(format!("Invalid expires_at: {}", e)))?,
            ),
            _ => match self.settings.default_expiry {
                Some(d) => Some(now.checked_add_signed(d).ok_or_else(|| {
                    SnaplinkError::validation("Default expiry is out of range")
                })?),
                None => None,
            },
        };

        if let Some(exp) = expires_at
            && exp <= now
        {
            return Err(SnaplinkError::validation(
                "expires_at must be in the future",
            ));
        }
        Ok(expires_at)
    }

    // ============ Issuance ============

    /// Issue a new short link
    pub async fn create_link(&self, req: CreateLinkRequest) -> Result<IssuedLink> {
        let target = req.url.trim().to_string();
        validate_url(&target)?;

        let now = Utc::now();
        let expires_at = self.resolve_expiry(req.expires_at.as_deref(), now)?;

        let password_hash = match req.password.filter(|p| !p.is_empty()) {
            Some(pwd) => Some(hash_password_blocking(pwd).await.inspect_err(|e| {
                error!("Failed to hash password: {}", e);
            })?),
            None => None,
        };

        let owner = req
            .owner
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty());

        let template = LinkRecord {
            code: String::new(),
            target,
            created_at: now,
            expires_at,
            password_hash,
            one_time_use: req.one_time,
            active: true,
            click_count: 0,
            owner,
            version: 0,
        };

        let (record, generated_code) = match req.code.filter(|c| !c.trim().is_empty()) {
            Some(custom) => {
                let custom = custom.trim().to_string();
                validate_custom_code(&custom)?;
                let record = LinkRecord {
                    code: custom.clone(),
                    ..template
                };
                let created = self.store.create(record).await.map_err(|e| match e {
                    SnaplinkError::Collision(_) => {
                        SnaplinkError::code_taken(format!("Code '{}' is already taken", custom))
                    }
                    other => other,
                })?;
                (created, false)
            }
            None => {
                let created = self
                    .generator
                    .issue_with(|code| {
                        let record = LinkRecord {
                            code,
                            ..template.clone()
                        };
                        self.store.create(record)
                    })
                    .await?;
                (created, true)
            }
        };

        info!(
            "LinkService: issued link '{}' -> '{}' (one_time: {}, protected: {}, expires_at: {:?})",
            record.code,
            record.target,
            record.one_time_use,
            record.is_password_protected(),
            record.expires_at
        );

        Ok(IssuedLink {
            short_url: self.short_url(&record.code),
            record,
            generated_code,
        })
    }

    // ============ Queries ============

    pub async fn get_link(&self, code: &str) -> Result<LinkRecord> {
        self.store.get(code).await
    }

    pub async fn list_by_owner(&self, owner: &str) -> Result<Vec<LinkRecord>> {
        self.store.list_by_owner(owner).await
    }

    pub async fn search(&self, req: SearchRequest) -> Result<Vec<LinkRecord>> {
        if req.exact && req.query.is_empty() {
            return Err(SnaplinkError::validation(
                "Exact search requires a non-empty query",
            ));
        }
        let limit = req
            .limit
            .unwrap_or(self.settings.search_limit)
            .clamp(1, self.settings.max_search_limit);

        let query = SearchQuery {
            text: req.query,
            exact: req.exact,
            owner: req.owner.filter(|o| !o.is_empty()),
            limit,
        };
        self.store.search(&query).await
    }

    // ============ Admin mutations ============

    pub async fn delete_link(&self, code: &str) -> Result<()> {
        self.store.delete(code).await?;
        self.cache.invalidate(code).await;
        info!("LinkService: deleted link '{}'", code);
        Ok(())
    }

    /// Enable or disable a link. A consumed one-time link stays consumed.
    pub async fn set_active(&self, code: &str, active: bool) -> Result<LinkRecord> {
        let result = self
            .store
            .update_atomic(code, &|current: &LinkRecord| {
                if active && current.is_consumed() {
                    return Err(SnaplinkError::validation(format!(
                        "Link '{}' is a consumed one-time link and cannot be re-enabled",
                        current.code
                    )));
                }
                let mut next = current.clone();
                next.active = active;
                Ok(next)
            })
            .await;

        let updated = self.settle(code, result).await?;
        info!(
            "LinkService: {} link '{}'",
            if active { "enabled" } else { "disabled" },
            code
        );
        Ok(updated)
    }

    pub async fn extend_expiry(&self, code: &str, req: ExtendRequest) -> Result<LinkRecord> {
        let now = Utc::now();
        let explicit = match req.expires_at.as_deref() {
            Some(s) if !s.trim().is_empty() => Some(
                TimeParser::parse_expire_time_at(s, now)
                    .map_err(|e| SnaplinkError::validation(format!("Invalid expires_at: {}", e)))?,
            ),
            _ => None,
        };
        if explicit.is_none() && req.days.is_none_or(|d| d == 0) {
            return Err(SnaplinkError::validation(
                "Either expires_at or a positive number of days is required",
            ));
        }
        let days = Duration::try_days(i64::from(req.days.unwrap_or(0)))
            .ok_or_else(|| SnaplinkError::validation("New expiry out of range"))?;

        let result = self
            .store
            .update_atomic(code, &|current: &LinkRecord| {
                let new_expiry = match explicit {
                    Some(at) => at,
                    None => current
                        .expires_at
                        .map_or(now, |exp| exp.max(now))
                        .checked_add_signed(days)
                        .ok_or_else(|| SnaplinkError::validation("New expiry out of range"))?,
                };
                if new_expiry <= now || new_expiry <= current.created_at {
                    return Err(SnaplinkError::validation(
                        "New expiry must be in the future",
                    ));
                }
                let mut next = current.clone();
                next.expires_at = Some(new_expiry);
                Ok(next)
            })
            .await;

        let updated = self.settle(code, result).await?;
        info!(
            "LinkService: extended link '{}' to {:?}",
            code, updated.expires_at
        );
        Ok(updated)
    }

    /// 变更后同步缓存；失败时移除可能过期的条目
    async fn settle(&self, code: &str, result: Result<LinkRecord>) -> Result<LinkRecord> {
        match result {
            Ok(updated) => {
                self.cache.refresh(&updated).await;
                Ok(updated)
            }
            Err(e) => {
                if matches!(e, SnaplinkError::NotFound(_)) {
                    self.cache.invalidate(code).await;
                }
                Err(e)
            }
        }
    }
}

//! Redirect resolution
//!
//! Lookup goes through the read-through cache, but the visit itself is a
//! single `update_atomic` on the store that re-checks every policy against
//! the authoritative record. Of N concurrent visits to a one-time link,
//! exactly one wins the version check; the others observe it inactive.
//! [`Resolver::peek`] runs the same checks without recording anything.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::cache::ReadThroughCache;
use crate::errors::{Result, SnaplinkError};
use crate::storage::{LinkRecord, LinkStore};
use crate::utils::password::verify_password_blocking;

/// Outcome of resolving a code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    Redirect { target: String, click_count: u64 },
    NotFound,
    Expired,
    Denied,
    Consumed,
}

impl ResolveOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolveOutcome::Redirect { .. } => "redirect",
            ResolveOutcome::NotFound => "not_found",
            ResolveOutcome::Expired => "expired",
            ResolveOutcome::Denied => "denied",
            ResolveOutcome::Consumed => "consumed",
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, ResolveOutcome::Redirect { .. })
    }

    /// 从中止更新的错误映射回结果
    fn from_abort(err: &SnaplinkError) -> Option<Self> {
        match err {
            SnaplinkError::NotFound(_) => Some(ResolveOutcome::NotFound),
            SnaplinkError::Expired(_) => Some(ResolveOutcome::Expired),
            SnaplinkError::Denied(_) => Some(ResolveOutcome::Denied),
            SnaplinkError::Consumed(_) => Some(ResolveOutcome::Consumed),
            _ => None,
        }
    }
}

/// 非活跃记录：一次性链接已用为 Consumed，其余（手动禁用）对外等同 Expired
fn inactive_outcome(record: &LinkRecord) -> ResolveOutcome {
    if record.is_consumed() {
        ResolveOutcome::Consumed
    } else {
        ResolveOutcome::Expired
    }
}

/// 预检结果：可访问的记录，或提前确定的结果
type Checked = std::result::Result<LinkRecord, ResolveOutcome>;

pub struct Resolver {
    store: Arc<dyn LinkStore>,
    cache: ReadThroughCache,
}

impl Resolver {
    pub fn new(store: Arc<dyn LinkStore>, cache: ReadThroughCache) -> Self {
        Self { store, cache }
    }

    /// Resolve `code`, recording the visit on success.
    ///
    /// `Err` only for infrastructure failures (`Unavailable`, `PasswordHash`).
    pub async fn resolve(&self, code: &str, password: Option<&str>) -> Result<ResolveOutcome> {
        let outcome = self.resolve_inner(code, password).await;
        match &outcome {
            Ok(o) => {
                let click_count = match o {
                    ResolveOutcome::Redirect { click_count, .. } => *click_count,
                    _ => 0,
                };
                info!(
                    target: "snaplink::events",
                    event = "resolve",
                    code,
                    outcome = o.as_str(),
                    click_count
                );
            }
            Err(e) => tracing::warn!(
                target: "snaplink::events",
                event = "resolve_failed",
                code,
                error = %e
            ),
        }
        outcome
    }

    /// Check whether `code` would redirect, without counting a visit.
    ///
    /// One-time links stay unconsumed; used for `HEAD` probes.
    pub async fn peek(&self, code: &str, password: Option<&str>) -> Result<ResolveOutcome> {
        let outcome = match self.check(code, password, Utc::now()).await? {
            Ok(record) => ResolveOutcome::Redirect {
                target: record.target,
                click_count: record.click_count,
            },
            Err(outcome) => outcome,
        };
        debug!("Peeked '{}': {}", code, outcome.as_str());
        Ok(outcome)
    }

    /// 经缓存查找并校验状态、过期与密码
    async fn check(
        &self,
        code: &str,
        password: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Checked> {
        let Some(record) = self
            .cache
            .get_or_load(code, || self.store.get(code))
            .await?
        else {
            return Ok(Err(ResolveOutcome::NotFound));
        };

        if !record.active {
            self.cache.invalidate(code).await;
            return Ok(Err(inactive_outcome(&record)));
        }
        if record.is_expired_at(now) {
            self.cache.invalidate(code).await;
            return Ok(Err(ResolveOutcome::Expired));
        }

        if let Some(ref hash) = record.password_hash {
            let Some(supplied) = password.filter(|p| !p.is_empty()) else {
                return Ok(Err(ResolveOutcome::Denied));
            };
            if !verify_password_blocking(supplied.to_string(), hash.clone()).await? {
                return Ok(Err(ResolveOutcome::Denied));
            }
        }

        Ok(Ok(record))
    }

    async fn resolve_inner(&self, code: &str, password: Option<&str>) -> Result<ResolveOutcome> {
        let now = Utc::now();

        let record = match self.check(code, password, now).await? {
            Ok(record) => record,
            Err(outcome) => return Ok(outcome),
        };

        let verified_hash = record.password_hash.clone();
        let result = self
            .store
            .update_atomic(code, &|current: &LinkRecord| {
                if !current.active {
                    return Err(match inactive_outcome(current) {
                        ResolveOutcome::Consumed => SnaplinkError::consumed("already used"),
                        _ => SnaplinkError::expired("inactive"),
                    });
                }
                if current.is_expired_at(now) {
                    return Err(SnaplinkError::expired("expired"));
                }
                // 校验所用的哈希必须仍是当前哈希
                if current.password_hash != verified_hash {
                    return Err(SnaplinkError::denied("password changed"));
                }
                let mut next = current.clone();
                next.click_count += 1;
                if next.one_time_use {
                    next.active = false;
                }
                Ok(next)
            })
            .await;

        match result {
            Ok(updated) => {
                self.cache.refresh(&updated).await;
                Ok(ResolveOutcome::Redirect {
                    target: updated.target,
                    click_count: updated.click_count,
                })
            }
            Err(e) => match ResolveOutcome::from_abort(&e) {
                Some(outcome) => {
                    self.cache.invalidate(code).await;
                    Ok(outcome)
                }
                None => Err(e),
            },
        }
    }
}

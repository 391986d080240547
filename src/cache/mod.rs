use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::CacheConfig;

pub mod object_cache;
mod read_through;
pub mod traits;

pub use object_cache::{MokaObjectCache, NullObjectCache};
pub use read_through::ReadThroughCache;
pub use traits::{CacheResult, ObjectCache, cache_ttl};

pub struct CacheFactory;

impl CacheFactory {
    /// 按 `cache.type` 构造读穿缓存
    pub fn create(config: &CacheConfig) -> ReadThroughCache {
        let default_ttl = Duration::from_secs(config.default_ttl);
        let object_cache: Arc<dyn ObjectCache> = match config.cache_type.as_str() {
            "null" => Arc::new(NullObjectCache::new()),
            _ => Arc::new(MokaObjectCache::new(config.max_capacity, default_ttl)),
        };
        info!(
            "Cache initialized: type={}, capacity={}, default_ttl={}s",
            config.cache_type, config.max_capacity, config.default_ttl
        );
        ReadThroughCache::new(
            object_cache,
            default_ttl,
            Duration::from_millis(config.timeout_ms),
        )
    }
}

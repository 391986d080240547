use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// Get the global configuration instance
///
/// Returns an Arc pointer to the configuration, which is cheap to clone
/// and doesn't hold any locks.
pub fn get_config() -> Arc<StaticConfig> {
    CONFIG
        .get()
        .expect("Config not initialized. Call init_config() first.")
        .load_full()
}

/// Initialize the global configuration
///
/// Loads configuration from `path` (or "config.toml" in the current directory)
/// overlaid by `SL__*` environment variables. A missing file falls back to
/// in-memory defaults.
///
/// # Examples
/// ```no_run
/// use snaplink::config::init_config;
/// init_config(None);
/// ```
pub fn init_config(path: Option<&str>) {
    CONFIG.get_or_init(|| ArcSwap::from_pointee(StaticConfig::load_from(path)));
}

/// Initialize (or replace) the global configuration with an explicit value.
pub fn init_config_with(config: StaticConfig) {
    match CONFIG.get() {
        Some(existing) => existing.store(Arc::new(config)),
        None => {
            if let Err(config) = CONFIG.set(ArcSwap::from_pointee(config)) {
                // 并发初始化时另一方先写入，覆盖为调用者的值
                if let Some(existing) = CONFIG.get() {
                    existing.store(config.load_full());
                }
            }
        }
    }
}

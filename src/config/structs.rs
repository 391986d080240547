use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SnaplinkError};

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含：
/// - server: 监听地址、端口、worker 数量
/// - database: 数据库连接与重试
/// - store: 存储调用超时与 CAS 重试上限
/// - cache: 读穿缓存
/// - codes: 短码字母表与长度
/// - links: 短链行为（base URL、默认过期、清理）
/// - bulk: 批量处理限制
/// - api: 管理接口令牌
/// - logging: 日志
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub codes: CodesConfig,
    #[serde(default)]
    pub links: LinksConfig,
    #[serde(default)]
    pub bulk: BulkConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：SL，分隔符：__
    /// 示例：SL__SERVER__PORT=9999
    pub fn load() -> Self {
        Self::load_from(None)
    }

    /// 从指定路径加载（`None` 时使用 `config.toml`）
    pub fn load_from(path: Option<&str>) -> Self {
        use config::{Config, Environment, File};

        let path = path.unwrap_or("config.toml");

        let builder = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::with_name(path).required(false))
            // 2. 从环境变量覆盖，前缀 SL，分隔符 __
            .add_source(
                Environment::with_prefix("SL")
                    .separator("__")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| SnaplinkError::serialization(e.to_string()))?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// 启动前校验，拒绝无法工作的组合
    pub fn validate(&self) -> Result<()> {
        self.codes.validate()?;

        if self.store.cas_max_attempts == 0 {
            return Err(SnaplinkError::validation(
                "store.cas_max_attempts must be at least 1",
            ));
        }
        if self.bulk.concurrency == 0 {
            return Err(SnaplinkError::validation(
                "bulk.concurrency must be at least 1",
            ));
        }
        if !matches!(self.cache.cache_type.as_str(), "memory" | "null") {
            return Err(SnaplinkError::validation(format!(
                "Unknown cache type '{}'. Valid: memory, null",
                self.cache.cache_type
            )));
        }
        if let Some(ref default_expiry) = self.links.default_expiry
            && !default_expiry.trim().is_empty()
        {
            crate::utils::TimeParser::parse_duration(default_expiry)
                .map_err(|e| SnaplinkError::validation(format!("links.default_expiry: {}", e)))?;
        }
        self.links.sweep_grace()?;
        url::Url::parse(&self.links.base_url).map_err(|e| {
            SnaplinkError::validation(format!(
                "links.base_url '{}' is not a valid URL: {}",
                self.links.base_url, e
            ))
        })?;
        Ok(())
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
    /// 优雅关闭等待时间（秒）
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `memory://` 使用进程内存储
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_database_timeout")]
    pub timeout: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// 存储调用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// 每次存储调用的截止时间
    #[serde(default = "default_store_timeout_ms")]
    pub timeout_ms: u64,
    /// compare-and-swap 冲突后的最大重试次数
    #[serde(default = "default_cas_max_attempts")]
    pub cas_max_attempts: u32,
}

/// 缓存系统配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// memory | null
    #[serde(rename = "type")]
    #[serde(default = "default_cache_type")]
    pub cache_type: String,
    #[serde(default = "default_cache_ttl")]
    pub default_ttl: u64,
    #[serde(default = "default_memory_capacity")]
    pub max_capacity: u64,
    #[serde(default = "default_cache_timeout_ms")]
    pub timeout_ms: u64,
}

/// 短码生成配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodesConfig {
    #[serde(default = "default_code_alphabet")]
    pub alphabet: String,
    #[serde(default = "default_code_length")]
    pub length: usize,
    #[serde(default = "default_code_max_attempts")]
    pub max_attempts: u32,
}

/// 短链行为配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinksConfig {
    /// 拼接 short_url 的前缀
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// 未指定过期时间时使用，例如 "30d"；为空表示永不过期
    #[serde(default)]
    pub default_expiry: Option<String>,
    /// 0 表示禁用后台清理
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    /// 过期超过该时长的记录才会被清理
    #[serde(default = "default_sweep_grace")]
    pub sweep_grace_secs: u64,
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
    #[serde(default = "default_max_search_limit")]
    pub max_search_limit: usize,
}

impl LinksConfig {
    /// `sweep_grace_secs` 转为时长，超出 chrono 可表示范围时报错
    pub fn sweep_grace(&self) -> Result<chrono::Duration> {
        i64::try_from(self.sweep_grace_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| {
                SnaplinkError::validation(format!(
                    "links.sweep_grace_secs is out of range: {}",
                    self.sweep_grace_secs
                ))
            })
    }
}

/// 批量处理配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkConfig {
    #[serde(default = "default_bulk_max_rows")]
    pub max_rows: usize,
    #[serde(default = "default_bulk_concurrency")]
    pub concurrency: usize,
}

/// 管理接口配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    /// Bearer 令牌，为空时禁用管理接口
    #[serde(default)]
    pub admin_token: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_log_file")]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

impl CodesConfig {
    /// 字母表至少 2 个不同字符，仅限 [A-Za-z0-9_-]；长度 1..=64
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for c in self.alphabet.chars() {
            if !(c.is_ascii_alphanumeric() || c == '-' || c == '_') {
                return Err(SnaplinkError::validation(format!(
                    "codes.alphabet contains unsupported character '{}'",
                    c
                )));
            }
            seen.insert(c);
        }
        if seen.len() < 2 {
            return Err(SnaplinkError::validation(
                "codes.alphabet must contain at least 2 distinct characters",
            ));
        }
        if seen.len() != self.alphabet.chars().count() {
            return Err(SnaplinkError::validation(
                "codes.alphabet must not contain duplicate characters",
            ));
        }
        if self.length == 0 || self.length > 64 {
            return Err(SnaplinkError::validation(format!(
                "codes.length must be between 1 and 64, got {}",
                self.length
            )));
        }
        if self.max_attempts == 0 {
            return Err(SnaplinkError::validation(
                "codes.max_attempts must be at least 1",
            ));
        }
        Ok(())
    }
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_database_url() -> String {
    "snaplink.db".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_database_timeout() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_store_timeout_ms() -> u64 {
    3000
}

fn default_cas_max_attempts() -> u32 {
    32
}

fn default_cache_type() -> String {
    "memory".to_string()
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_memory_capacity() -> u64 {
    10000
}

fn default_cache_timeout_ms() -> u64 {
    50
}

pub(crate) fn default_code_alphabet() -> String {
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789".to_string()
}

fn default_code_length() -> usize {
    7
}

fn default_code_max_attempts() -> u32 {
    5
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_sweep_interval() -> u64 {
    3600
}

fn default_sweep_grace() -> u64 {
    86400
}

fn default_search_limit() -> usize {
    20
}

fn default_max_search_limit() -> usize {
    200
}

fn default_bulk_max_rows() -> usize {
    1000
}

fn default_bulk_concurrency() -> usize {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_file() -> Option<String> {
    None
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            timeout: default_database_timeout(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_store_timeout_ms(),
            cas_max_attempts: default_cas_max_attempts(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_type: default_cache_type(),
            default_ttl: default_cache_ttl(),
            max_capacity: default_memory_capacity(),
            timeout_ms: default_cache_timeout_ms(),
        }
    }
}

impl Default for CodesConfig {
    fn default() -> Self {
        Self {
            alphabet: default_code_alphabet(),
            length: default_code_length(),
            max_attempts: default_code_max_attempts(),
        }
    }
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_expiry: None,
            sweep_interval_secs: default_sweep_interval(),
            sweep_grace_secs: default_sweep_grace(),
            search_limit: default_search_limit(),
            max_search_limit: default_max_search_limit(),
        }
    }
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            max_rows: default_bulk_max_rows(),
            concurrency: default_bulk_concurrency(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: default_log_file(),
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = StaticConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.codes.length, 7);
        assert_eq!(config.codes.max_attempts, 5);
        assert!(config.links.default_expiry.is_none());
    }

    #[test]
    fn test_sample_config_roundtrips_through_toml() {
        let sample = StaticConfig::generate_sample_config();
        assert!(sample.contains("[codes]"));
        assert!(sample.contains("[bulk]"));

        let parsed: StaticConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.server.port, 8080);
        assert_eq!(parsed.cache.cache_type, "memory");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: StaticConfig = toml::from_str(
            r#"
            [codes]
            length = 10
            "#,
        )
        .unwrap();
        assert_eq!(parsed.codes.length, 10);
        assert_eq!(parsed.codes.alphabet, default_code_alphabet());
        assert_eq!(parsed.bulk.max_rows, 1000);
    }

    #[test]
    fn test_codes_validation() {
        let mut codes = CodesConfig::default();
        codes.alphabet = "a".to_string();
        assert!(codes.validate().is_err());

        codes.alphabet = "aa".to_string();
        assert!(codes.validate().is_err());

        codes.alphabet = "ab!".to_string();
        assert!(codes.validate().is_err());

        codes.alphabet = "ab".to_string();
        codes.length = 0;
        assert!(codes.validate().is_err());

        codes.length = 65;
        assert!(codes.validate().is_err());

        codes.length = 64;
        assert!(codes.validate().is_ok());
    }

    #[test]
    fn test_unknown_cache_type_rejected() {
        let mut config = StaticConfig::default();
        config.cache.cache_type = "redis".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_default_expiry_rejected() {
        let mut config = StaticConfig::default();
        config.links.default_expiry = Some("soon".to_string());
        assert!(config.validate().is_err());

        config.links.default_expiry = Some("30d".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sweep_grace_range() {
        let mut config = StaticConfig::default();
        assert_eq!(
            config.links.sweep_grace().unwrap(),
            chrono::Duration::seconds(config.links.sweep_grace_secs as i64)
        );

        config.links.sweep_grace_secs = u64::MAX;
        assert!(config.links.sweep_grace().is_err());
        assert!(config.validate().is_err());

        config.links.sweep_grace_secs = i64::MAX as u64;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        StaticConfig::default().save_to_file(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("[links]"));
    }
}

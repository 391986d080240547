pub mod csv_handler;
pub mod password;
pub mod time_parser;
pub mod url_validator;

pub use time_parser::TimeParser;
pub use url_validator::validate_url;

/// 路由保留名，不能作为自定义短码
pub const RESERVED_CODES: &[&str] = &["api", "admin", "bulk", "health", "favicon.ico", "robots.txt"];

/// 短码外形检查：1..=64 个 `[A-Za-z0-9_-]` 字符。
/// 重定向路径在访问存储前先过一遍，不合法直接 404。
#[inline]
pub fn is_valid_short_code(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= 64
        && code
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

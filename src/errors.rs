use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnaplinkError {
    Validation(String),
    Collision(String),
    CapacityExhausted(String),
    CodeTaken(String),
    NotFound(String),
    Expired(String),
    Denied(String),
    Consumed(String),
    Unavailable(String),
    DatabaseConfig(String),
    Serialization(String),
    FileOperation(String),
    PasswordHash(String),
}

impl SnaplinkError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            SnaplinkError::Validation(_) => "E001",
            SnaplinkError::Collision(_) => "E002",
            SnaplinkError::CapacityExhausted(_) => "E003",
            SnaplinkError::CodeTaken(_) => "E004",
            SnaplinkError::NotFound(_) => "E005",
            SnaplinkError::Expired(_) => "E006",
            SnaplinkError::Denied(_) => "E007",
            SnaplinkError::Consumed(_) => "E008",
            SnaplinkError::Unavailable(_) => "E009",
            SnaplinkError::DatabaseConfig(_) => "E010",
            SnaplinkError::Serialization(_) => "E011",
            SnaplinkError::FileOperation(_) => "E012",
            SnaplinkError::PasswordHash(_) => "E013",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            SnaplinkError::Validation(_) => "Validation Error",
            SnaplinkError::Collision(_) => "Code Collision",
            SnaplinkError::CapacityExhausted(_) => "Code Space Exhausted",
            SnaplinkError::CodeTaken(_) => "Code Already Taken",
            SnaplinkError::NotFound(_) => "Link Not Found",
            SnaplinkError::Expired(_) => "Link Expired",
            SnaplinkError::Denied(_) => "Access Denied",
            SnaplinkError::Consumed(_) => "Link Consumed",
            SnaplinkError::Unavailable(_) => "Storage Unavailable",
            SnaplinkError::DatabaseConfig(_) => "Database Configuration Error",
            SnaplinkError::Serialization(_) => "Serialization Error",
            SnaplinkError::FileOperation(_) => "File Operation Error",
            SnaplinkError::PasswordHash(_) => "Password Hash Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            SnaplinkError::Validation(msg)
            | SnaplinkError::Collision(msg)
            | SnaplinkError::CapacityExhausted(msg)
            | SnaplinkError::CodeTaken(msg)
            | SnaplinkError::NotFound(msg)
            | SnaplinkError::Expired(msg)
            | SnaplinkError::Denied(msg)
            | SnaplinkError::Consumed(msg)
            | SnaplinkError::Unavailable(msg)
            | SnaplinkError::DatabaseConfig(msg)
            | SnaplinkError::Serialization(msg)
            | SnaplinkError::FileOperation(msg)
            | SnaplinkError::PasswordHash(msg) => msg,
        }
    }

    /// 变体名，用于批量结果等机器可读场景
    pub fn kind(&self) -> &'static str {
        match self {
            SnaplinkError::Validation(_) => "Validation",
            SnaplinkError::Collision(_) => "Collision",
            SnaplinkError::CapacityExhausted(_) => "CapacityExhausted",
            SnaplinkError::CodeTaken(_) => "CodeTaken",
            SnaplinkError::NotFound(_) => "NotFound",
            SnaplinkError::Expired(_) => "Expired",
            SnaplinkError::Denied(_) => "Denied",
            SnaplinkError::Consumed(_) => "Consumed",
            SnaplinkError::Unavailable(_) => "Unavailable",
            SnaplinkError::DatabaseConfig(_) => "DatabaseConfig",
            SnaplinkError::Serialization(_) => "Serialization",
            SnaplinkError::FileOperation(_) => "FileOperation",
            SnaplinkError::PasswordHash(_) => "PasswordHash",
        }
    }

    /// HTTP 状态码映射
    pub fn http_status(&self) -> StatusCode {
        match self {
            SnaplinkError::Validation(_) => StatusCode::BAD_REQUEST,
            SnaplinkError::CodeTaken(_) | SnaplinkError::Collision(_) => StatusCode::CONFLICT,
            SnaplinkError::NotFound(_) | SnaplinkError::Expired(_) | SnaplinkError::Consumed(_) => {
                StatusCode::NOT_FOUND
            }
            SnaplinkError::Denied(_) => StatusCode::UNAUTHORIZED,
            SnaplinkError::CapacityExhausted(_) | SnaplinkError::Unavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            SnaplinkError::DatabaseConfig(_)
            | SnaplinkError::Serialization(_)
            | SnaplinkError::FileOperation(_)
            | SnaplinkError::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 调用方可以带退避重试的错误
    pub fn is_retryable(&self) -> bool {
        matches!(self, SnaplinkError::Unavailable(_))
    }

    /// 格式化为彩色输出（用于 Server 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for SnaplinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for SnaplinkError {}

// 便捷的构造函数
impl SnaplinkError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::Validation(msg.into())
    }

    pub fn collision<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::Collision(msg.into())
    }

    pub fn capacity_exhausted<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::CapacityExhausted(msg.into())
    }

    pub fn code_taken<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::CodeTaken(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::NotFound(msg.into())
    }

    pub fn expired<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::Expired(msg.into())
    }

    pub fn denied<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::Denied(msg.into())
    }

    pub fn consumed<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::Consumed(msg.into())
    }

    pub fn unavailable<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::Unavailable(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::DatabaseConfig(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::Serialization(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::FileOperation(msg.into())
    }

    pub fn password_hash<T: Into<String>>(msg: T) -> Self {
        SnaplinkError::PasswordHash(msg.into())
    }
}

// 存储层 I/O 错误统一视为 Unavailable，由调用方决定是否重试
impl From<sea_orm::DbErr> for SnaplinkError {
    fn from(err: sea_orm::DbErr) -> Self {
        SnaplinkError::Unavailable(err.to_string())
    }
}

impl From<std::io::Error> for SnaplinkError {
    fn from(err: std::io::Error) -> Self {
        SnaplinkError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for SnaplinkError {
    fn from(err: serde_json::Error) -> Self {
        SnaplinkError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for SnaplinkError {
    fn from(err: csv::Error) -> Self {
        SnaplinkError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SnaplinkError>;

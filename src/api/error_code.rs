//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::SnaplinkError;

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字，按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 3000-3099: 链接错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    // 成功
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    Unauthorized = 1001,
    NotFound = 1004,
    InternalServerError = 1005,
    BatchSizeTooLarge = 1010,
    ServiceUnavailable = 1030,

    // 链接错误 3000-3099
    LinkNotFound = 3000,
    LinkAlreadyExists = 3001,
    LinkInvalidRequest = 3002,
    LinkPasswordHashError = 3004,
    LinkDatabaseError = 3005,
    LinkCodeSpaceExhausted = 3007,
    LinkExpired = 3008,
    LinkConsumed = 3009,
    LinkPasswordRequired = 3010,
}

impl From<&SnaplinkError> for ErrorCode {
    fn from(err: &SnaplinkError) -> Self {
        match err {
            SnaplinkError::Validation(_) => ErrorCode::LinkInvalidRequest,
            SnaplinkError::Collision(_) | SnaplinkError::CodeTaken(_) => {
                ErrorCode::LinkAlreadyExists
            }
            SnaplinkError::CapacityExhausted(_) => ErrorCode::LinkCodeSpaceExhausted,
            SnaplinkError::NotFound(_) => ErrorCode::LinkNotFound,
            SnaplinkError::Expired(_) => ErrorCode::LinkExpired,
            SnaplinkError::Consumed(_) => ErrorCode::LinkConsumed,
            SnaplinkError::Denied(_) => ErrorCode::LinkPasswordRequired,
            SnaplinkError::Unavailable(_) => ErrorCode::ServiceUnavailable,
            SnaplinkError::DatabaseConfig(_) => ErrorCode::LinkDatabaseError,
            SnaplinkError::PasswordHash(_) => ErrorCode::LinkPasswordHashError,
            SnaplinkError::Serialization(_) | SnaplinkError::FileOperation(_) => {
                ErrorCode::InternalServerError
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::LinkNotFound).unwrap(), "3000");
        assert_eq!(serde_json::to_string(&ErrorCode::Success).unwrap(), "0");
    }

    #[test]
    fn test_from_snaplink_error() {
        assert_eq!(
            ErrorCode::from(&SnaplinkError::code_taken("x")),
            ErrorCode::LinkAlreadyExists
        );
        assert_eq!(
            ErrorCode::from(&SnaplinkError::unavailable("x")),
            ErrorCode::ServiceUnavailable
        );
    }
}

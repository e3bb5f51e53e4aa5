use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum ZaplinkerError {
    Unauthorized(String),
    Validation {
        message: String,
        details: Option<serde_json::Value>,
    },
    NotFound(String),
    Forbidden(String),
    DuplicateSlug(String),
    LinkInactive(String),
    PlanLimitReached(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Serialization(String),
    Internal(String),
}

impl ZaplinkerError {
    /// 获取对外暴露的错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ZaplinkerError::Unauthorized(_) => "UNAUTHORIZED",
            ZaplinkerError::Validation { .. } => "VALIDATION_ERROR",
            ZaplinkerError::NotFound(_) => "NOT_FOUND",
            ZaplinkerError::Forbidden(_) => "FORBIDDEN",
            ZaplinkerError::DuplicateSlug(_) => "DUPLICATE_SLUG",
            ZaplinkerError::LinkInactive(_) => "LINK_INACTIVE",
            ZaplinkerError::PlanLimitReached(_) => "PLAN_LIMIT_REACHED",
            ZaplinkerError::DatabaseConfig(_)
            | ZaplinkerError::DatabaseConnection(_)
            | ZaplinkerError::DatabaseOperation(_)
            | ZaplinkerError::Serialization(_)
            | ZaplinkerError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 映射 HTTP 状态码
    pub fn http_status(&self) -> StatusCode {
        match self {
            ZaplinkerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ZaplinkerError::Validation { .. } => StatusCode::BAD_REQUEST,
            ZaplinkerError::NotFound(_) => StatusCode::NOT_FOUND,
            ZaplinkerError::Forbidden(_) | ZaplinkerError::PlanLimitReached(_) => {
                StatusCode::FORBIDDEN
            }
            ZaplinkerError::DuplicateSlug(_) => StatusCode::CONFLICT,
            ZaplinkerError::LinkInactive(_) => StatusCode::GONE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            ZaplinkerError::Unauthorized(_) => "Unauthorized",
            ZaplinkerError::Validation { .. } => "Validation Error",
            ZaplinkerError::NotFound(_) => "Resource Not Found",
            ZaplinkerError::Forbidden(_) => "Forbidden",
            ZaplinkerError::DuplicateSlug(_) => "Duplicate Slug",
            ZaplinkerError::LinkInactive(_) => "Link Inactive",
            ZaplinkerError::PlanLimitReached(_) => "Plan Limit Reached",
            ZaplinkerError::DatabaseConfig(_) => "Database Configuration Error",
            ZaplinkerError::DatabaseConnection(_) => "Database Connection Error",
            ZaplinkerError::DatabaseOperation(_) => "Database Operation Error",
            ZaplinkerError::Serialization(_) => "Serialization Error",
            ZaplinkerError::Internal(_) => "Internal Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            ZaplinkerError::Unauthorized(msg)
            | ZaplinkerError::NotFound(msg)
            | ZaplinkerError::Forbidden(msg)
            | ZaplinkerError::DuplicateSlug(msg)
            | ZaplinkerError::LinkInactive(msg)
            | ZaplinkerError::PlanLimitReached(msg)
            | ZaplinkerError::DatabaseConfig(msg)
            | ZaplinkerError::DatabaseConnection(msg)
            | ZaplinkerError::DatabaseOperation(msg)
            | ZaplinkerError::Serialization(msg)
            | ZaplinkerError::Internal(msg) => msg,
            ZaplinkerError::Validation { message, .. } => message,
        }
    }

    /// 结构化校验细节（仅 VALIDATION_ERROR 携带）
    pub fn details(&self) -> Option<&serde_json::Value> {
        match self {
            ZaplinkerError::Validation { details, .. } => details.as_ref(),
            _ => None,
        }
    }

    /// 5xx 错误不向客户端暴露内部信息
    pub fn public_message(&self) -> &str {
        if self.http_status().is_server_error() {
            "Internal server error"
        } else {
            self.message()
        }
    }

    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for ZaplinkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ZaplinkerError {}

// 便捷的构造函数
impl ZaplinkerError {
    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        ZaplinkerError::Unauthorized(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        ZaplinkerError::Validation {
            message: msg.into(),
            details: None,
        }
    }

    pub fn validation_with_details<T: Into<String>>(msg: T, details: serde_json::Value) -> Self {
        ZaplinkerError::Validation {
            message: msg.into(),
            details: Some(details),
        }
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        ZaplinkerError::NotFound(msg.into())
    }

    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        ZaplinkerError::Forbidden(msg.into())
    }

    pub fn duplicate_slug<T: Into<String>>(msg: T) -> Self {
        ZaplinkerError::DuplicateSlug(msg.into())
    }

    pub fn link_inactive<T: Into<String>>(msg: T) -> Self {
        ZaplinkerError::LinkInactive(msg.into())
    }

    pub fn plan_limit_reached<T: Into<String>>(msg: T) -> Self {
        ZaplinkerError::PlanLimitReached(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        ZaplinkerError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        ZaplinkerError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        ZaplinkerError::DatabaseOperation(msg.into())
    }

    pub fn internal<T: Into<String>>(msg: T) -> Self {
        ZaplinkerError::Internal(msg.into())
    }
}

impl From<sea_orm::DbErr> for ZaplinkerError {
    fn from(err: sea_orm::DbErr) -> Self {
        ZaplinkerError::DatabaseOperation(err.to_string())
    }
}

impl From<sea_orm::TransactionError<sea_orm::DbErr>> for ZaplinkerError {
    fn from(err: sea_orm::TransactionError<sea_orm::DbErr>) -> Self {
        ZaplinkerError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for ZaplinkerError {
    fn from(err: std::io::Error) -> Self {
        ZaplinkerError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for ZaplinkerError {
    fn from(err: serde_json::Error) -> Self {
        ZaplinkerError::Serialization(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for ZaplinkerError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        ZaplinkerError::Unauthorized(format!("Invalid session token: {}", err))
    }
}

impl From<validator::ValidationErrors> for ZaplinkerError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(&errors).ok();
        ZaplinkerError::Validation {
            message: "Request validation failed".to_string(),
            details,
        }
    }
}

pub type Result<T> = std::result::Result<T, ZaplinkerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_statuses() {
        let cases = [
            (ZaplinkerError::unauthorized("x"), "UNAUTHORIZED", 401),
            (ZaplinkerError::validation("x"), "VALIDATION_ERROR", 400),
            (ZaplinkerError::not_found("x"), "NOT_FOUND", 404),
            (ZaplinkerError::forbidden("x"), "FORBIDDEN", 403),
            (ZaplinkerError::duplicate_slug("x"), "DUPLICATE_SLUG", 409),
            (ZaplinkerError::link_inactive("x"), "LINK_INACTIVE", 410),
            (ZaplinkerError::plan_limit_reached("x"), "PLAN_LIMIT_REACHED", 403),
            (ZaplinkerError::database_operation("x"), "INTERNAL_ERROR", 500),
            (ZaplinkerError::internal("x"), "INTERNAL_ERROR", 500),
        ];

        for (err, code, status) in cases {
            assert_eq!(err.code(), code);
            assert_eq!(err.http_status().as_u16(), status);
        }
    }

    #[test]
    fn test_public_message_hides_internal_details() {
        let err = ZaplinkerError::database_operation("UNIQUE constraint failed: links.slug");
        assert_eq!(err.public_message(), "Internal server error");

        let err = ZaplinkerError::not_found("Link not found");
        assert_eq!(err.public_message(), "Link not found");
    }

    #[test]
    fn test_details_only_on_validation() {
        let err = ZaplinkerError::validation_with_details(
            "bad",
            serde_json::json!({"phone": ["invalid"]}),
        );
        assert!(err.details().is_some());
        assert!(ZaplinkerError::not_found("x").details().is_none());
    }

    #[test]
    fn test_display_uses_simple_format() {
        let err = ZaplinkerError::duplicate_slug("Slug 'promo' is already taken");
        assert_eq!(
            err.to_string(),
            "Duplicate Slug: Slug 'promo' is already taken"
        );
    }
}

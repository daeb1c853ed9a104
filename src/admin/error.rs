//! Admin API 错误类型

use std::fmt;

use axum::http::StatusCode;

use crate::common::ErrorResponse;

#[derive(Debug)]
pub enum AdminServiceError {
    /// 订阅者不存在
    NotFound { user_id: String },
    /// 请求参数非法
    InvalidInput(String),
    /// 唯一约束冲突（Stripe customer ID 已被其他用户占用）
    Conflict(String),
    /// 缺少必要配置
    Configuration(String),
    Internal(anyhow::Error),
}

impl fmt::Display for AdminServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { user_id } => write!(f, "subscriber {} not found", user_id),
            Self::InvalidInput(msg) => write!(f, "{}", msg),
            Self::Conflict(msg) => write!(f, "{}", msg),
            Self::Configuration(msg) => write!(f, "{}", msg),
            Self::Internal(e) => write!(f, "internal error: {}", e),
        }
    }
}

impl std::error::Error for AdminServiceError {}

impl AdminServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Configuration(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_response(self) -> ErrorResponse {
        match self {
            e @ Self::NotFound { .. } => ErrorResponse::new("not_found", e.to_string()),
            Self::InvalidInput(msg) => ErrorResponse::new("invalid_request", msg),
            Self::Conflict(msg) => ErrorResponse::new("conflict", msg),
            Self::Configuration(msg) => ErrorResponse::new("configuration_error", msg),
            Self::Internal(e) => {
                tracing::error!(endpoint = "admin", "Admin 请求失败: {:?}", e);
                ErrorResponse::internal_error()
            }
        }
    }
}

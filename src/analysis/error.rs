//! 分析请求错误类型

use std::fmt;

use axum::http::StatusCode;

use crate::common::ErrorResponse;
use crate::pagespeed::PsiError;

#[derive(Debug)]
pub enum AnalyzeError {
    /// 请求参数非法
    InvalidInput(String),
    /// 超出当日免费额度
    QuotaExceeded { limit: u32 },
    /// 服务端配置缺失（如 PSI 密钥）
    Configuration(String),
    /// 外部分析服务失败
    ExternalService { status: Option<u16>, body: String },
    /// 存储等内部错误
    Internal(anyhow::Error),
}

impl fmt::Display for AnalyzeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            Self::QuotaExceeded { limit } => write!(f, "daily limit of {} reached", limit),
            Self::Configuration(msg) => write!(f, "configuration error: {}", msg),
            Self::ExternalService {
                status: Some(status),
                body,
            } => write!(f, "PSI API error: {} {}", status, body),
            Self::ExternalService { status: None, body } => write!(f, "PSI API error: {}", body),
            Self::Internal(e) => write!(f, "internal error: {}", e),
        }
    }
}

impl std::error::Error for AnalyzeError {}

impl From<PsiError> for AnalyzeError {
    fn from(e: PsiError) -> Self {
        match e {
            PsiError::MissingApiKey => Self::Configuration(e.to_string()),
            PsiError::Http { status, body } => Self::ExternalService {
                status: Some(status),
                body,
            },
            PsiError::Unreachable(msg) | PsiError::InvalidPayload(msg) => {
                Self::ExternalService { status: None, body: msg }
            }
        }
    }
}

impl From<anyhow::Error> for AnalyzeError {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(e)
    }
}

impl AnalyzeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ExternalService { .. } => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 转换为 JSON 错误响应（内部错误不暴露细节）
    pub fn into_response(self) -> ErrorResponse {
        match self {
            Self::InvalidInput(msg) => ErrorResponse::new("invalid_request", msg),
            Self::QuotaExceeded { limit } => ErrorResponse::new(
                "quota_exceeded",
                format!(
                    "Daily limit of {} analyses reached. Upgrade for unlimited analyses.",
                    limit
                ),
            ),
            Self::Configuration(msg) => ErrorResponse::new("configuration_error", msg),
            e @ Self::ExternalService { .. } => {
                ErrorResponse::new("external_service_error", e.to_string())
            }
            Self::Internal(e) => {
                tracing::error!(endpoint = "analyze", "分析请求内部错误: {:?}", e);
                ErrorResponse::internal_error()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_psi_errors_map_to_kinds() {
        let config: AnalyzeError = PsiError::MissingApiKey.into();
        assert_eq!(config.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = config.into_response();
        assert_eq!(body.error.error_type, "configuration_error");
        assert!(body.error.message.contains("GOOGLE_PSI_API_KEY"));

        let upstream: AnalyzeError = PsiError::Http {
            status: 500,
            body: "boom".to_string(),
        }
        .into();
        assert_eq!(upstream.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(upstream.into_response().error.message, "PSI API error: 500 boom");

        let unreachable: AnalyzeError = PsiError::Unreachable("timeout".to_string()).into();
        assert_eq!(unreachable.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_quota_and_internal_responses() {
        let quota = AnalyzeError::QuotaExceeded { limit: 5 };
        assert_eq!(quota.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(quota.into_response().error.error_type, "quota_exceeded");

        let internal = AnalyzeError::Internal(anyhow::anyhow!("disk I/O error at /var/db"));
        let body = internal.into_response();
        assert!(!body.error.message.contains("/var/db"));
    }
}

//! 共享状态、身份解析与定时任务认证

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};

use crate::analysis::AnalysisService;
use crate::billing::SubscriptionService;
use crate::common::{ErrorResponse, auth, session};
use crate::model::identity::Identity;

/// API 共享状态
#[derive(Clone)]
pub struct AppState {
    pub analysis: AnalysisService,
    pub billing: Arc<SubscriptionService>,
    /// 用户会话 token 的签名密钥，未配置时所有请求都按匿名处理
    pub session_secret: Option<String>,
    /// 定时任务共享密钥，未配置时定时接口始终拒绝
    pub cron_secret: Option<String>,
}

impl AppState {
    pub fn new(
        analysis: AnalysisService,
        billing: SubscriptionService,
        session_secret: Option<String>,
        cron_secret: Option<String>,
    ) -> Self {
        Self {
            analysis,
            billing: Arc::new(billing),
            session_secret: session_secret.filter(|s| !s.is_empty()),
            cron_secret: cron_secret.filter(|s| !s.is_empty()),
        }
    }

    /// 解析调用者身份：有效会话 token 优先，其次转发头中的客户端地址
    pub fn identity(&self, headers: &HeaderMap) -> Identity {
        let user_id = self.session_secret.as_deref().and_then(|secret| {
            let token = auth::extract_bearer(headers)?;
            match session::verify_token(token, secret) {
                Ok(claims) => Some(claims.sub),
                Err(e) => {
                    tracing::debug!("会话 token 无效，按匿名处理: {}", e);
                    None
                }
            }
        });
        Identity::resolve(user_id, auth::client_address(headers))
    }
}

/// 定时任务认证中间件（`Authorization: Bearer <cronSecret>`）
pub async fn cron_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let authorized = match (
        state.cron_secret.as_deref(),
        auth::extract_bearer(request.headers()),
    ) {
        (Some(expected), Some(provided)) => auth::constant_time_eq(provided, expected),
        _ => false,
    };

    if authorized {
        next.run(request).await
    } else {
        tracing::warn!("定时任务认证失败");
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::authentication_error()),
        )
            .into_response()
    }
}

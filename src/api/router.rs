//! 路由配置

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers::{
    analyze, get_usage, history, rate_vital, reset_usage, stripe_webhook, vital_thresholds,
};
use super::middleware::{AppState, cron_auth_middleware};
use crate::admin::{AdminState, create_admin_router};

/// 创建完整的 HTTP 路由
///
/// # 端点
/// - `POST /api/analyze` - 分析 URL
/// - `GET /api/usage` - 今日用量
/// - `GET /api/history` - 历史分析（需登录）
/// - `GET /api/vitals/thresholds` - Core Web Vitals 阈值表
/// - `GET /api/vitals/rate` - 按阈值表评级单个指标
/// - `POST /api/stripe/webhooks` - Stripe 事件回调
/// - `GET /api/cron/reset-usage` - 清理前一天的用量（需 cron 密钥）
/// - `/api/admin/*` - Admin API（配置了 adminApiKey 时才挂载）
pub fn create_router(state: AppState, admin: Option<AdminState>) -> Router {
    let cron = Router::new()
        .route("/reset-usage", get(reset_usage))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            cron_auth_middleware,
        ));

    let mut api = Router::new()
        .route("/analyze", post(analyze))
        .route("/usage", get(get_usage))
        .route("/history", get(history))
        .route("/vitals/thresholds", get(vital_thresholds))
        .route("/vitals/rate", get(rate_vital))
        .route("/stripe/webhooks", post(stripe_webhook))
        .nest("/cron", cron)
        .with_state(state);

    if let Some(admin) = admin {
        api = api.nest("/admin", create_admin_router(admin));
    }

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

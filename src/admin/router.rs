//! Admin API 路由配置

use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::{
    handlers::{create_session, get_subscriber, list_subscribers, upsert_subscriber},
    middleware::{AdminState, admin_auth_middleware},
};

/// 创建 Admin API 路由
///
/// # 端点
/// - `GET /subscribers` - 列出所有订阅者
/// - `GET /subscribers/{userId}` - 获取单个订阅者
/// - `PUT /subscribers/{userId}` - 创建订阅者或更新关联信息
/// - `POST /sessions` - 为用户签发会话 token
///
/// # 认证
/// 需要 Admin API Key 认证，支持：
/// - `x-api-key` header
/// - `Authorization: Bearer <token>` header
pub fn create_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/subscribers", get(list_subscribers))
        .route(
            "/subscribers/{user_id}",
            get(get_subscriber).put(upsert_subscriber),
        )
        .route("/sessions", post(create_session))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ))
        .with_state(state)
}

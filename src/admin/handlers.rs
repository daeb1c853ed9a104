//! Admin API HTTP 处理器

use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use super::{
    middleware::AdminState,
    types::{CreateSessionRequest, UpsertSubscriberRequest},
};

/// GET /api/admin/subscribers
pub async fn list_subscribers(State(state): State<AdminState>) -> Response {
    match state.service.list_subscribers().await {
        Ok(response) => Json(response).into_response(),
        Err(e) => (e.status_code(), Json(e.into_response())).into_response(),
    }
}

/// GET /api/admin/subscribers/{userId}
pub async fn get_subscriber(
    State(state): State<AdminState>,
    Path(user_id): Path<String>,
) -> Response {
    match state.service.get_subscriber(&user_id).await {
        Ok(subscriber) => Json(subscriber).into_response(),
        Err(e) => (e.status_code(), Json(e.into_response())).into_response(),
    }
}

/// PUT /api/admin/subscribers/{userId}
pub async fn upsert_subscriber(
    State(state): State<AdminState>,
    Path(user_id): Path<String>,
    Json(payload): Json<UpsertSubscriberRequest>,
) -> Response {
    match state.service.upsert_subscriber(&user_id, payload).await {
        Ok(subscriber) => Json(subscriber).into_response(),
        Err(e) => (e.status_code(), Json(e.into_response())).into_response(),
    }
}

/// POST /api/admin/sessions
pub async fn create_session(
    State(state): State<AdminState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Response {
    match state.service.create_session(&payload.user_id) {
        Ok(session) => Json(session).into_response(),
        Err(e) => (e.status_code(), Json(e.into_response())).into_response(),
    }
}

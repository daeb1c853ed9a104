//! API HTTP 处理器

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;

use super::middleware::AppState;
use super::types::{
    AnalyzeRequest, AnalyzeResponse, HistoryQuery, RateQuery, RateResponse, ResetUsageResponse,
    WebhookAck,
};
use crate::analysis::AnalyzeError;
use crate::common::ErrorResponse;
use crate::pagespeed::vitals;
use crate::store::usage::day_key;
use crate::usage::UsageLedger;

const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

fn internal_error(endpoint: &str, e: impl std::fmt::Display) -> Response {
    tracing::error!(endpoint, "请求处理失败: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::internal_error()),
    )
        .into_response()
}

/// POST /api/analyze
///
/// 分析在独立任务中执行，客户端断开不会中断外部调用和后续写入
pub async fn analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Response {
    let Json(AnalyzeRequest { url, device_type }) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            let e = AnalyzeError::InvalidInput(rejection.body_text());
            return (e.status_code(), Json(e.into_response())).into_response();
        }
    };
    let identity = state.identity(&headers);
    let service = state.analysis.clone();

    let task =
        tokio::spawn(async move { service.analyze(&url, device_type, &identity).await });

    match task.await {
        Ok(Ok(outcome)) => Json(AnalyzeResponse {
            data: outcome.record,
            usage: outcome.usage,
        })
        .into_response(),
        Ok(Err(e)) => (e.status_code(), Json(e.into_response())).into_response(),
        Err(e) => internal_error("analyze", e),
    }
}

/// GET /api/usage
pub async fn get_usage(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let identity = state.identity(&headers);
    match state.analysis.usage_snapshot(&identity).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => internal_error("usage", e),
    }
}

/// GET /api/history?page=N
pub async fn history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let identity = state.identity(&headers);
    let Some(user_id) = identity.user_id() else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::authentication_error()),
        )
            .into_response();
    };

    match state
        .analysis
        .history(user_id, query.page.unwrap_or(1))
        .await
    {
        Ok(page) => Json(page).into_response(),
        Err(e) => internal_error("history", e),
    }
}

/// GET /api/vitals/thresholds
pub async fn vital_thresholds() -> impl IntoResponse {
    Json(vitals::table())
}

/// GET /api/vitals/rate?metric=LCP&value=2300
pub async fn rate_vital(Query(query): Query<RateQuery>) -> Response {
    if !query.value.is_finite() || query.value < 0.0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "invalid_request",
                "value must be a non-negative number",
            )),
        )
            .into_response();
    }
    Json(RateResponse {
        metric: query.metric,
        value: query.value,
        rating: query.metric.rate(query.value),
    })
    .into_response()
}

/// POST /api/stripe/webhooks
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    match state.billing.handle_webhook(&body, signature).await {
        Ok(_) => Json(WebhookAck { received: true }).into_response(),
        Err(e) => (e.status_code(), Json(e.into_response())).into_response(),
    }
}

/// GET /api/cron/reset-usage
///
/// 删除前一个本地日的全部用量计数
pub async fn reset_usage(State(state): State<AppState>) -> Response {
    let Some(yesterday) = UsageLedger::today().pred_opt() else {
        return internal_error("reset-usage", "日期溢出");
    };

    match state.analysis.ledger().reset_for_date(yesterday).await {
        Ok(deleted) => Json(ResetUsageResponse {
            success: true,
            day: day_key(yesterday),
            deleted,
        })
        .into_response(),
        Err(e) => internal_error("reset-usage", e),
    }
}

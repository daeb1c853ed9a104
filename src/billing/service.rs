//! 订阅状态机
//!
//! ```text
//! free ──checkout──▶ active ◀──payment_succeeded── past_due
//!                      │  ──payment_failed──▶         │
//!                      └──────subscription_deleted────┴──▶ canceled
//! ```
//!
//! 每个事件按 Stripe customer/subscription ID 定位唯一订阅者，未找到时为 no-op。
//! 状态机没有回到 free 的迁移：取消后停留在 canceled。

use std::fmt;

use axum::http::StatusCode;
use rusqlite::Connection;
use serde::Serialize;

use super::event::{BillingEvent, ParsedEvent};
use super::signature::{self, SignatureError};
use crate::common::ErrorResponse;
use crate::model::subscription::SubscriptionStatus;
use crate::store::{Database, subscribers};

/// 事件处理结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "result")]
pub enum BillingOutcome {
    /// 状态已迁移
    Applied {
        user_id: String,
        status: SubscriptionStatus,
    },
    /// 没有匹配的订阅者
    NoMatch,
    /// 事件类型或内容与订阅无关
    Ignored,
}

#[derive(Debug)]
pub enum BillingError {
    /// 未配置 webhook 密钥
    NotConfigured,
    /// 缺少 Stripe-Signature 头
    MissingSignature,
    /// 签名校验失败
    SignatureInvalid(SignatureError),
    /// 请求体不是合法事件
    InvalidPayload(String),
    Internal(anyhow::Error),
}

impl fmt::Display for BillingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "webhook secret is not configured"),
            Self::MissingSignature => write!(f, "missing Stripe-Signature header"),
            Self::SignatureInvalid(e) => write!(f, "invalid signature: {}", e),
            Self::InvalidPayload(msg) => write!(f, "invalid event payload: {}", msg),
            Self::Internal(e) => write!(f, "internal error: {}", e),
        }
    }
}

impl std::error::Error for BillingError {}

impl BillingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotConfigured
            | Self::MissingSignature
            | Self::SignatureInvalid(_)
            | Self::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_response(self) -> ErrorResponse {
        match self {
            Self::NotConfigured | Self::MissingSignature => {
                ErrorResponse::new("invalid_request", "Invalid request")
            }
            Self::SignatureInvalid(_) => ErrorResponse::new("invalid_signature", "Invalid signature"),
            Self::InvalidPayload(_) => ErrorResponse::new("invalid_request", "Invalid event payload"),
            Self::Internal(e) => {
                tracing::error!(endpoint = "stripe-webhook", "处理 webhook 失败: {:?}", e);
                ErrorResponse::new("internal_error", "Webhook processing failed")
            }
        }
    }
}

/// 订阅服务：校验并应用账单事件
pub struct SubscriptionService {
    db: Database,
    webhook_secret: Option<String>,
    tolerance_secs: i64,
}

impl SubscriptionService {
    pub fn new(db: Database, webhook_secret: Option<String>, tolerance_secs: i64) -> Self {
        Self {
            db,
            webhook_secret: webhook_secret.filter(|s| !s.is_empty()),
            tolerance_secs,
        }
    }

    /// 处理原始 webhook：先验签，验签失败的事件绝不处理
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
    ) -> Result<BillingOutcome, BillingError> {
        let secret = self
            .webhook_secret
            .as_deref()
            .ok_or(BillingError::NotConfigured)?;
        let header = signature_header.ok_or(BillingError::MissingSignature)?;

        let now = chrono::Utc::now().timestamp();
        if let Err(e) = signature::verify(payload, header, secret, now, self.tolerance_secs) {
            tracing::warn!("Stripe webhook 签名校验失败: {}", e);
            return Err(BillingError::SignatureInvalid(e));
        }

        let ParsedEvent { id, event } = BillingEvent::parse(payload).map_err(|e| {
            tracing::warn!("Stripe webhook 事件解析失败: {}", e);
            BillingError::InvalidPayload(e.to_string())
        })?;

        let outcome = self.apply(event).await?;
        tracing::info!(event_id = %id, ?outcome, "Stripe webhook 已处理");
        Ok(outcome)
    }

    /// 应用单个事件
    pub async fn apply(&self, event: BillingEvent) -> Result<BillingOutcome, BillingError> {
        self.db
            .call(move |conn| apply_event(conn, &event))
            .await
            .map_err(BillingError::Internal)
    }
}

fn apply_event(conn: &Connection, event: &BillingEvent) -> anyhow::Result<BillingOutcome> {
    match event {
        BillingEvent::CheckoutCompleted {
            customer_id: Some(customer_id),
            subscription_id: Some(subscription_id),
        } => {
            let Some(subscriber) = subscribers::find_by_customer(conn, customer_id)? else {
                tracing::debug!(customer_id = %customer_id, "checkout 事件没有对应的订阅者");
                return Ok(BillingOutcome::NoMatch);
            };
            subscribers::set_subscription(
                conn,
                &subscriber.user_id,
                Some(subscription_id.as_str()),
                SubscriptionStatus::Active,
            )?;
            Ok(applied(subscriber.user_id, SubscriptionStatus::Active))
        }
        BillingEvent::CheckoutCompleted { .. } => Ok(BillingOutcome::Ignored),
        BillingEvent::PaymentSucceeded {
            subscription_id: Some(subscription_id),
        } => set_status_by_subscription(conn, subscription_id, SubscriptionStatus::Active),
        BillingEvent::PaymentFailed {
            subscription_id: Some(subscription_id),
        } => set_status_by_subscription(conn, subscription_id, SubscriptionStatus::PastDue),
        BillingEvent::PaymentSucceeded { subscription_id: None }
        | BillingEvent::PaymentFailed { subscription_id: None } => Ok(BillingOutcome::Ignored),
        BillingEvent::SubscriptionCanceled { subscription_id } => {
            let Some(subscriber) = subscribers::find_by_subscription(conn, subscription_id)? else {
                tracing::debug!(subscription_id = %subscription_id, "取消事件没有对应的订阅者");
                return Ok(BillingOutcome::NoMatch);
            };
            subscribers::set_subscription(conn, &subscriber.user_id, None, SubscriptionStatus::Canceled)?;
            Ok(applied(subscriber.user_id, SubscriptionStatus::Canceled))
        }
        BillingEvent::Other { kind } => {
            tracing::debug!(kind = %kind, "忽略未处理的 Stripe 事件");
            Ok(BillingOutcome::Ignored)
        }
    }
}

fn set_status_by_subscription(
    conn: &Connection,
    subscription_id: &str,
    status: SubscriptionStatus,
) -> anyhow::Result<BillingOutcome> {
    let Some(subscriber) = subscribers::find_by_subscription(conn, subscription_id)? else {
        tracing::debug!(subscription_id = %subscription_id, "发票事件没有对应的订阅者");
        return Ok(BillingOutcome::NoMatch);
    };
    subscribers::set_status(conn, &subscriber.user_id, status)?;
    Ok(applied(subscriber.user_id, status))
}

fn applied(user_id: String, status: SubscriptionStatus) -> BillingOutcome {
    tracing::info!(user_id = %user_id, status = %status, "订阅状态已更新");
    BillingOutcome::Applied { user_id, status }
}

//! Stripe webhook 事件
//!
//! 只解析状态机关心的四类事件，其余类型保留 `type` 后忽略。

use serde::Deserialize;

/// 订阅相关的账单事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingEvent {
    /// `checkout.session.completed`
    CheckoutCompleted {
        customer_id: Option<String>,
        subscription_id: Option<String>,
    },
    /// `invoice.payment_succeeded`
    PaymentSucceeded { subscription_id: Option<String> },
    /// `invoice.payment_failed`
    PaymentFailed { subscription_id: Option<String> },
    /// `customer.subscription.deleted`
    SubscriptionCanceled { subscription_id: String },
    /// 不处理的事件类型
    Other { kind: String },
}

/// 带事件 ID 的解析结果
#[derive(Debug, Clone)]
pub struct ParsedEvent {
    pub id: String,
    pub event: BillingEvent,
}

#[derive(Deserialize)]
struct RawEvent {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    data: RawEventData,
}

#[derive(Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

/// Stripe 的可展开字段：字符串 ID 或带 `id` 的对象
#[derive(Deserialize)]
#[serde(untagged)]
enum Expandable {
    Id(String),
    Object { id: String },
}

impl Expandable {
    fn into_id(self) -> String {
        match self {
            Self::Id(id) | Self::Object { id } => id,
        }
    }
}

#[derive(Deserialize)]
struct CheckoutSession {
    customer: Option<Expandable>,
    subscription: Option<Expandable>,
}

#[derive(Deserialize)]
struct Invoice {
    subscription: Option<Expandable>,
    /// 新版 API 把订阅移到了 `parent.subscription_details.subscription`
    parent: Option<InvoiceParent>,
}

#[derive(Deserialize)]
struct InvoiceParent {
    subscription_details: Option<SubscriptionDetails>,
}

#[derive(Deserialize)]
struct SubscriptionDetails {
    subscription: Option<Expandable>,
}

impl Invoice {
    fn subscription_id(self) -> Option<String> {
        self.subscription
            .or_else(|| {
                self.parent
                    .and_then(|p| p.subscription_details)
                    .and_then(|d| d.subscription)
            })
            .map(Expandable::into_id)
    }
}

#[derive(Deserialize)]
struct Subscription {
    id: String,
}

impl BillingEvent {
    /// 解析 webhook 请求体
    pub fn parse(payload: &[u8]) -> Result<ParsedEvent, serde_json::Error> {
        let raw: RawEvent = serde_json::from_slice(payload)?;
        let object = raw.data.object;

        let event = match raw.kind.as_str() {
            "checkout.session.completed" => {
                let session: CheckoutSession = serde_json::from_value(object)?;
                Self::CheckoutCompleted {
                    customer_id: session.customer.map(Expandable::into_id),
                    subscription_id: session.subscription.map(Expandable::into_id),
                }
            }
            "invoice.payment_succeeded" => {
                let invoice: Invoice = serde_json::from_value(object)?;
                Self::PaymentSucceeded {
                    subscription_id: invoice.subscription_id(),
                }
            }
            "invoice.payment_failed" => {
                let invoice: Invoice = serde_json::from_value(object)?;
                Self::PaymentFailed {
                    subscription_id: invoice.subscription_id(),
                }
            }
            "customer.subscription.deleted" => {
                let subscription: Subscription = serde_json::from_value(object)?;
                Self::SubscriptionCanceled {
                    subscription_id: subscription.id,
                }
            }
            _ => Self::Other { kind: raw.kind },
        };

        Ok(ParsedEvent { id: raw.id, event })
    }
}

//! Admin API 类型定义

use serde::{Deserialize, Serialize};

use crate::store::subscribers::Subscriber;

/// 订阅者列表响应
#[derive(Debug, Serialize)]
pub struct SubscribersResponse {
    pub total: usize,
    pub subscribers: Vec<Subscriber>,
}

/// 创建或更新订阅者关联信息
///
/// 不包含状态字段：状态只能由账单事件改变
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertSubscriberRequest {
    pub email: Option<String>,
    pub stripe_customer_id: Option<String>,
}

/// 签发会话请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub user_id: String,
}

/// 会话 token 响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub expires_in: u64,
}

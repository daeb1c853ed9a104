//! API 请求/响应类型

use serde::{Deserialize, Serialize};

use crate::model::analysis::{AnalysisRecord, DeviceType, Rating};
use crate::pagespeed::vitals::Vital;
use crate::usage::UsageSnapshot;

/// POST /api/analyze 请求体
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub device_type: DeviceType,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub data: AnalysisRecord,
    pub usage: UsageSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RateQuery {
    pub metric: Vital,
    pub value: f64,
}

#[derive(Debug, Serialize)]
pub struct RateResponse {
    pub metric: Vital,
    pub value: f64,
    pub rating: Rating,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetUsageResponse {
    pub success: bool,
    pub day: String,
    pub deleted: usize,
}

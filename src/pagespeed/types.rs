//! PSI v5 `runPagespeed` 响应类型（只声明用到的字段）

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PsiResponse {
    pub lighthouse_result: LighthouseResult,
    /// 真实用户体验数据（CrUX），站点流量不足时缺失
    #[serde(default)]
    pub loading_experience: Option<LoadingExperience>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LighthouseResult {
    #[serde(default)]
    pub categories: Categories,
    #[serde(default)]
    pub audits: Audits,
}

#[derive(Debug, Default, Deserialize)]
pub struct Categories {
    pub performance: Option<CategoryScore>,
    pub accessibility: Option<CategoryScore>,
    #[serde(rename = "best-practices")]
    pub best_practices: Option<CategoryScore>,
    pub seo: Option<CategoryScore>,
}

/// 分类分数，范围 0.0-1.0；Lighthouse 运行出错时为 null
#[derive(Debug, Deserialize)]
pub struct CategoryScore {
    pub score: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Audits {
    #[serde(rename = "speed-index")]
    pub speed_index: Option<Audit>,
    #[serde(rename = "server-response-time")]
    pub server_response_time: Option<Audit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Audit {
    pub numeric_value: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoadingExperience {
    #[serde(default)]
    pub metrics: FieldMetrics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct FieldMetrics {
    pub largest_contentful_paint_ms: Option<FieldMetric>,
    pub cumulative_layout_shift_score: Option<FieldMetric>,
    pub interaction_to_next_paint_ms: Option<FieldMetric>,
    pub first_contentful_paint_ms: Option<FieldMetric>,
}

/// 单个 CrUX 指标：第 75 百分位值与三档速度分类
#[derive(Debug, Deserialize)]
pub struct FieldMetric {
    pub percentile: Option<f64>,
    pub category: Option<SpeedCategory>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpeedCategory {
    Fast,
    Average,
    Slow,
    #[serde(other)]
    Unknown,
}

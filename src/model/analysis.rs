//! 分析结果数据模型

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 设备类型（对应 PSI 的 strategy 参数）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    #[default]
    Mobile,
    Desktop,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Desktop => "desktop",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mobile" => Ok(Self::Mobile),
            "desktop" => Ok(Self::Desktop),
            other => Err(anyhow::anyhow!("未知的设备类型: {}", other)),
        }
    }
}

/// 指标评级
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Rating {
    Good,
    NeedsImprovement,
    Poor,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::NeedsImprovement => "needs-improvement",
            Self::Poor => "poor",
        }
    }
}

impl FromStr for Rating {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "good" => Ok(Self::Good),
            "needs-improvement" => Ok(Self::NeedsImprovement),
            "poor" => Ok(Self::Poor),
            other => Err(anyhow::anyhow!("未知的评级: {}", other)),
        }
    }
}

/// 归一化后的分析结果
///
/// 分数为 0-100 整数；指标缺失时为 None，不会被当成 0
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub performance_score: u32,
    pub accessibility_score: u32,
    pub best_practices_score: u32,
    pub seo_score: u32,
    pub speed_index: Option<f64>,
    pub lcp: Option<f64>,
    pub cls: Option<f64>,
    pub inp: Option<f64>,
    pub fcp: Option<f64>,
    pub ttfb: Option<f64>,
    pub lcp_rating: Option<Rating>,
    pub cls_rating: Option<Rating>,
    pub inp_rating: Option<Rating>,
    pub fcp_rating: Option<Rating>,
    pub ttfb_rating: Option<Rating>,
}

/// 外部分析器的输出：归一化结果 + 原始响应
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub result: AnalysisResult,
    pub raw_json: String,
}

/// 持久化的分析记录，创建后不再修改
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub id: String,
    pub user_id: Option<String>,
    pub url: String,
    pub device_type: DeviceType,
    #[serde(flatten)]
    pub result: AnalysisResult,
    /// 仅付费用户保留原始 PSI 响应
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lighthouse_json: Option<String>,
    pub created_at: DateTime<Utc>,
}

//! Core Web Vitals 本地阈值表
//!
//! 参考 web.dev 的划分。分析结果的评级来自 CrUX，这里只用于前端展示和对比。

use serde::{Deserialize, Serialize};

use crate::model::analysis::Rating;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Vital {
    Lcp,
    Cls,
    Inp,
    Fcp,
    Ttfb,
}

/// 阈值：`<= good` 为 good，`<= needs_improvement` 为 needs-improvement，其余为 poor
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Threshold {
    pub good: f64,
    pub needs_improvement: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdEntry {
    pub metric: Vital,
    pub unit: &'static str,
    #[serde(flatten)]
    pub threshold: Threshold,
}

pub const ALL: [Vital; 5] = [Vital::Lcp, Vital::Cls, Vital::Inp, Vital::Fcp, Vital::Ttfb];

impl Vital {
    pub fn threshold(&self) -> Threshold {
        let (good, needs_improvement) = match self {
            Self::Lcp => (2500.0, 4000.0),
            Self::Cls => (0.1, 0.25),
            Self::Inp => (200.0, 500.0),
            Self::Fcp => (1800.0, 3000.0),
            Self::Ttfb => (800.0, 1800.0),
        };
        Threshold {
            good,
            needs_improvement,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Self::Cls => "unitless",
            _ => "ms",
        }
    }

    pub fn rate(&self, value: f64) -> Rating {
        let t = self.threshold();
        if value <= t.good {
            Rating::Good
        } else if value <= t.needs_improvement {
            Rating::NeedsImprovement
        } else {
            Rating::Poor
        }
    }
}

/// 完整阈值表
pub fn table() -> Vec<ThresholdEntry> {
    ALL.iter()
        .map(|v| ThresholdEntry {
            metric: *v,
            unit: v.unit(),
            threshold: v.threshold(),
        })
        .collect()
}

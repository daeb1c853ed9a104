//! PSI 响应归一化
//!
//! 评级只取自 CrUX 的 FAST/AVERAGE/SLOW 分类，不用本地阈值重新计算；
//! CrUX 不提供 TTFB 分类，因此 `ttfb_rating` 恒为 None。

use super::types::{CategoryScore, FieldMetric, PsiResponse, SpeedCategory};
use crate::model::analysis::{AnalysisResult, Rating};

/// 0.0-1.0 分数换算为 0-100 整数，缺失时为 0
fn scale_score(category: Option<&CategoryScore>) -> u32 {
    let score = category.and_then(|c| c.score).unwrap_or(0.0);
    (score * 100.0).round().clamp(0.0, 100.0) as u32
}

fn category_to_rating(category: Option<SpeedCategory>) -> Rating {
    match category {
        Some(SpeedCategory::Fast) => Rating::Good,
        Some(SpeedCategory::Average) => Rating::NeedsImprovement,
        Some(SpeedCategory::Slow) | Some(SpeedCategory::Unknown) | None => Rating::Poor,
    }
}

fn field_value(metric: Option<&FieldMetric>) -> Option<f64> {
    metric.and_then(|m| m.percentile)
}

fn field_rating(metric: Option<&FieldMetric>) -> Option<Rating> {
    metric.map(|m| category_to_rating(m.category))
}

pub fn normalize(response: &PsiResponse) -> AnalysisResult {
    let lighthouse = &response.lighthouse_result;
    let categories = &lighthouse.categories;
    let audits = &lighthouse.audits;
    let field = response.loading_experience.as_ref().map(|le| &le.metrics);

    let lcp = field.and_then(|m| m.largest_contentful_paint_ms.as_ref());
    let cls = field.and_then(|m| m.cumulative_layout_shift_score.as_ref());
    let inp = field.and_then(|m| m.interaction_to_next_paint_ms.as_ref());
    let fcp = field.and_then(|m| m.first_contentful_paint_ms.as_ref());

    AnalysisResult {
        performance_score: scale_score(categories.performance.as_ref()),
        accessibility_score: scale_score(categories.accessibility.as_ref()),
        best_practices_score: scale_score(categories.best_practices.as_ref()),
        seo_score: scale_score(categories.seo.as_ref()),
        speed_index: audits.speed_index.as_ref().and_then(|a| a.numeric_value),
        lcp: field_value(lcp),
        cls: field_value(cls),
        inp: field_value(inp),
        fcp: field_value(fcp),
        ttfb: audits.server_response_time.as_ref().and_then(|a| a.numeric_value),
        lcp_rating: field_rating(lcp),
        cls_rating: field_rating(cls),
        inp_rating: field_rating(inp),
        fcp_rating: field_rating(fcp),
        ttfb_rating: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> PsiResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_scores_are_rounded_percentages() {
        let response = parse(serde_json::json!({
            "lighthouseResult": {
                "categories": {
                    "performance": {"score": 0.87},
                    "accessibility": {"score": 0.995},
                    "best-practices": {"score": 1.0},
                    "seo": {"score": 0.004}
                }
            }
        }));
        let result = normalize(&response);
        assert_eq!(result.performance_score, 87);
        assert_eq!(result.accessibility_score, 100);
        assert_eq!(result.best_practices_score, 100);
        assert_eq!(result.seo_score, 0);
    }

    #[test]
    fn test_every_category_score_maps_to_round_times_hundred() {
        for step in 0..=1000 {
            let s = step as f64 / 1000.0;
            let response = parse(serde_json::json!({
                "lighthouseResult": {"categories": {"performance": {"score": s}}}
            }));
            let score = normalize(&response).performance_score;
            assert_eq!(score, (s * 100.0).round() as u32);
            assert!(score <= 100);
        }
    }

    #[test]
    fn test_missing_or_null_scores_default_to_zero() {
        let response = parse(serde_json::json!({
            "lighthouseResult": {"categories": {"performance": {"score": null}}}
        }));
        let result = normalize(&response);
        assert_eq!(result.performance_score, 0);
        assert_eq!(result.accessibility_score, 0);
    }

    #[test]
    fn test_field_metrics_drive_values_and_ratings() {
        let response = parse(serde_json::json!({
            "lighthouseResult": {
                "categories": {"performance": {"score": 0.87}},
                "audits": {
                    "speed-index": {"numericValue": 3100.5},
                    "server-response-time": {"numericValue": 420.0},
                    "largest-contentful-paint": {"numericValue": 9999.0}
                }
            },
            "loadingExperience": {
                "metrics": {
                    "LARGEST_CONTENTFUL_PAINT_MS": {"percentile": 2200, "category": "FAST"},
                    "CUMULATIVE_LAYOUT_SHIFT_SCORE": {"percentile": 12, "category": "AVERAGE"},
                    "INTERACTION_TO_NEXT_PAINT_MS": {"percentile": 640, "category": "SLOW"},
                    "FIRST_INPUT_DELAY_MS": {"percentile": 10, "category": "FAST"}
                }
            }
        }));
        let result = normalize(&response);

        assert_eq!(result.performance_score, 87);
        assert_eq!(result.lcp, Some(2200.0));
        assert_eq!(result.lcp_rating, Some(Rating::Good));
        assert_eq!(result.cls, Some(12.0));
        assert_eq!(result.cls_rating, Some(Rating::NeedsImprovement));
        assert_eq!(result.inp, Some(640.0));
        assert_eq!(result.inp_rating, Some(Rating::Poor));
        // FCP 缺失：值和评级都是 None，不会被当成 0
        assert_eq!(result.fcp, None);
        assert_eq!(result.fcp_rating, None);
        assert_eq!(result.speed_index, Some(3100.5));
        assert_eq!(result.ttfb, Some(420.0));
        assert_eq!(result.ttfb_rating, None);
    }

    #[test]
    fn test_without_loading_experience_ratings_are_absent() {
        let response = parse(serde_json::json!({
            "lighthouseResult": {"audits": {"speed-index": {}}}
        }));
        let result = normalize(&response);
        assert_eq!(result.speed_index, None);
        assert_eq!(result.lcp, None);
        assert_eq!(result.lcp_rating, None);
        assert_eq!(result.cls_rating, None);
    }

    #[test]
    fn test_unknown_category_falls_back_to_poor() {
        let response = parse(serde_json::json!({
            "lighthouseResult": {},
            "loadingExperience": {
                "metrics": {"FIRST_CONTENTFUL_PAINT_MS": {"percentile": 1500, "category": "NONE"}}
            }
        }));
        assert_eq!(normalize(&response).fcp_rating, Some(Rating::Poor));
    }
}

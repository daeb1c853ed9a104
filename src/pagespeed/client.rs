//! 外部分析器
//!
//! `Analyzer` 是编排层依赖的抽象，`PsiClient` 通过 HTTP 调用 PSI v5 实现它。

use std::fmt;

use futures::future::BoxFuture;

use super::normalize::normalize;
use super::types::PsiResponse;
use crate::common::truncate_with_ellipsis;
use crate::http_client::{ProxyConfig, build_client};
use crate::model::analysis::{AnalysisReport, DeviceType};
use crate::model::config::Config;

/// 外部分析失败
#[derive(Debug)]
pub enum PsiError {
    /// 未配置 API 密钥（运维可修复的配置错误）
    MissingApiKey,
    /// PSI 返回非 2xx 状态
    Http { status: u16, body: String },
    /// 网络不可达、超时等
    Unreachable(String),
    /// 响应体无法解析
    InvalidPayload(String),
}

impl fmt::Display for PsiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "GOOGLE_PSI_API_KEY is not set"),
            Self::Http { status, body } => write!(f, "PSI API error: {} {}", status, body),
            Self::Unreachable(msg) => write!(f, "PSI API unreachable: {}", msg),
            Self::InvalidPayload(msg) => write!(f, "PSI API returned an invalid payload: {}", msg),
        }
    }
}

impl std::error::Error for PsiError {}

/// 外部分析器抽象
pub trait Analyzer: Send + Sync {
    fn analyze<'a>(
        &'a self,
        url: &'a str,
        device: DeviceType,
    ) -> BoxFuture<'a, Result<AnalysisReport, PsiError>>;
}

/// 请求的 Lighthouse 分类（PSI 默认只返回 performance）
const CATEGORIES: &[&str] = &["performance", "accessibility", "best-practices", "seo"];

/// 日志中保留的上游错误体长度
const LOG_BODY_LIMIT: usize = 512;

/// PageSpeed Insights HTTP 客户端
pub struct PsiClient {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl PsiClient {
    pub fn new(client: reqwest::Client, api_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    /// 按全局配置构建（超时、代理、TLS）
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let proxy = ProxyConfig::from_config(config);
        let client = build_client(proxy.as_ref(), config.psi_timeout_secs, config.tls_backend)?;
        Ok(Self::new(client, &config.psi_api_url, config.psi_api_key.clone()))
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn run(&self, url: &str, device: DeviceType) -> Result<AnalysisReport, PsiError> {
        let api_key = self.api_key.as_deref().ok_or(PsiError::MissingApiKey)?;

        let mut query: Vec<(&str, &str)> = vec![
            ("url", url),
            ("key", api_key),
            ("strategy", device.as_str()),
        ];
        query.extend(CATEGORIES.iter().map(|c| ("category", *c)));

        tracing::debug!(url = %url, strategy = %device, "调用 PSI API");
        let response = self
            .client
            .get(&self.api_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| PsiError::Unreachable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PsiError::Unreachable(e.to_string()))?;

        if !status.is_success() {
            tracing::warn!(
                status = status.as_u16(),
                body = %truncate_with_ellipsis(&body, LOG_BODY_LIMIT),
                "PSI API 返回错误"
            );
            return Err(PsiError::Http {
                status: status.as_u16(),
                body,
            });
        }

        #[cfg(feature = "sensitive-logs")]
        tracing::debug!(body = %body, "PSI API 响应");

        let parsed: PsiResponse = serde_json::from_str(&body)
            .map_err(|e| PsiError::InvalidPayload(e.to_string()))?;

        Ok(AnalysisReport {
            result: normalize(&parsed),
            raw_json: body,
        })
    }
}

impl Analyzer for PsiClient {
    fn analyze<'a>(
        &'a self,
        url: &'a str,
        device: DeviceType,
    ) -> BoxFuture<'a, Result<AnalysisReport, PsiError>> {
        Box::pin(self.run(url, device))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{Router, extract::RawQuery, http::StatusCode, routing::get};
    use parking_lot::Mutex;

    use super::*;
    use crate::model::analysis::Rating;

    fn client(api_key: Option<&str>) -> PsiClient {
        PsiClient::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9/runPagespeed",
            api_key.map(str::to_string),
        )
    }

    #[tokio::test]
    async fn test_missing_api_key_is_configuration_error() {
        let psi = client(None);
        assert!(!psi.has_api_key());
        let err = psi.analyze("https://example.com", DeviceType::Mobile).await.unwrap_err();
        assert!(matches!(err, PsiError::MissingApiKey));
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        assert!(!client(Some("  ")).has_api_key());
        assert!(client(Some("key")).has_api_key());
    }

    #[test]
    fn test_error_display_carries_status_and_body() {
        let err = PsiError::Http {
            status: 429,
            body: "{\"error\":\"quota\"}".to_string(),
        };
        assert_eq!(err.to_string(), "PSI API error: 429 {\"error\":\"quota\"}");
    }

    /// 本地 PSI 替身：返回基地址和最近一次请求的查询串
    async fn serve_psi() -> (String, Arc<Mutex<Option<String>>>) {
        let seen = Arc::new(Mutex::new(None));
        let captured = seen.clone();
        let app = Router::new()
            .route(
                "/quota",
                get(|| async { (StatusCode::TOO_MANY_REQUESTS, "{\"error\":\"quota\"}") }),
            )
            .route("/garbage", get(|| async { "<html>not json</html>" }))
            .route(
                "/ok",
                get(move |RawQuery(query): RawQuery| {
                    let captured = captured.clone();
                    async move {
                        *captured.lock() = query;
                        serde_json::json!({
                            "lighthouseResult": {
                                "categories": {"performance": {"score": 0.87}},
                                "audits": {"speed-index": {"numericValue": 3100.5}}
                            },
                            "loadingExperience": {
                                "metrics": {
                                    "LARGEST_CONTENTFUL_PAINT_MS": {"percentile": 2200, "category": "FAST"}
                                }
                            }
                        })
                        .to_string()
                    }
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), seen)
    }

    fn client_at(base: &str, path: &str) -> PsiClient {
        PsiClient::new(
            reqwest::Client::new(),
            format!("{}{}", base, path),
            Some("test-key".to_string()),
        )
    }

    #[tokio::test]
    async fn test_non_success_status_keeps_status_and_body() {
        let (base, _) = serve_psi().await;
        let err = client_at(&base, "/quota")
            .analyze("https://example.com", DeviceType::Mobile)
            .await
            .unwrap_err();
        match err {
            PsiError::Http { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "{\"error\":\"quota\"}");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unparseable_body_is_invalid_payload() {
        let (base, _) = serve_psi().await;
        let err = client_at(&base, "/garbage")
            .analyze("https://example.com", DeviceType::Mobile)
            .await
            .unwrap_err();
        assert!(matches!(err, PsiError::InvalidPayload(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_success_is_normalized_and_query_complete() {
        let (base, seen) = serve_psi().await;
        let report = client_at(&base, "/ok")
            .analyze("https://example.com", DeviceType::Desktop)
            .await
            .unwrap();

        assert_eq!(report.result.performance_score, 87);
        assert_eq!(report.result.lcp, Some(2200.0));
        assert_eq!(report.result.lcp_rating, Some(Rating::Good));
        assert_eq!(report.result.speed_index, Some(3100.5));
        assert!(report.raw_json.contains("lighthouseResult"));

        let query = seen.lock().clone().unwrap();
        assert!(query.contains("url=https%3A%2F%2Fexample.com"), "{}", query);
        assert!(query.contains("key=test-key"));
        assert!(query.contains("strategy=desktop"));
        for category in ["performance", "accessibility", "best-practices", "seo"] {
            assert!(query.contains(&format!("category={}", category)), "{}", query);
        }
    }
}

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use super::error::AnalyzeError;
use crate::model::analysis::{AnalysisRecord, DeviceType};
use crate::model::identity::Identity;
use crate::model::subscription::{SubscriptionStatus, Tier};
use crate::pagespeed::Analyzer;
use crate::store::{self, Database};
use crate::usage::{UsageLedger, UsageSnapshot};

/// 历史记录每页条数
pub const HISTORY_PAGE_SIZE: u32 = 10;

/// 一次成功分析的结果
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub record: AnalysisRecord,
    pub usage: UsageSnapshot,
}

/// 分页的历史记录
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    pub analyses: Vec<AnalysisRecord>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub pages: u64,
}

/// 请求编排服务
///
/// 启动时构建一次，分析器、用量账本和数据库句柄均由外部注入。
#[derive(Clone)]
pub struct AnalysisService {
    analyzer: Arc<dyn Analyzer>,
    ledger: UsageLedger,
    db: Database,
}

impl AnalysisService {
    pub fn new(analyzer: Arc<dyn Analyzer>, ledger: UsageLedger, db: Database) -> Self {
        Self {
            analyzer,
            ledger,
            db,
        }
    }

    pub fn ledger(&self) -> &UsageLedger {
        &self.ledger
    }

    /// 订阅状态为 active 才是付费等级，其余（含匿名）都按免费处理
    pub async fn resolve_tier(&self, identity: &Identity) -> anyhow::Result<Tier> {
        let Some(user_id) = identity.user_id().map(str::to_string) else {
            return Ok(Tier::Free);
        };
        let subscriber = self
            .db
            .call(move |conn| store::subscribers::get(conn, &user_id))
            .await?;
        Ok(subscriber
            .map(|s| s.status)
            .unwrap_or(SubscriptionStatus::Free)
            .tier())
    }

    /// 执行一次分析
    ///
    /// 配额不足时直接返回，不调用外部分析器，也不写任何数据。
    pub async fn analyze(
        &self,
        url: &str,
        device: DeviceType,
        identity: &Identity,
    ) -> Result<AnalysisOutcome, AnalyzeError> {
        let url = validate_url(url)?;
        let tier = self.resolve_tier(identity).await?;

        if !self.ledger.allowed(identity, tier).await? {
            let limit = self.ledger.limit_for(tier).unwrap_or_default();
            tracing::info!(identity = ?identity.usage_key(), limit, "已达到每日分析上限");
            return Err(AnalyzeError::QuotaExceeded { limit });
        }

        let report = self
            .analyzer
            .analyze(&url, device)
            .await
            .inspect_err(|e| tracing::warn!(url = %url, "外部分析失败: {}", e))?;

        let record = AnalysisRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: identity.user_id().map(str::to_string),
            url,
            device_type: device,
            result: report.result,
            lighthouse_json: tier.is_paid().then_some(report.raw_json),
            created_at: Utc::now(),
        };

        let to_insert = record.clone();
        self.db
            .call(move |conn| store::analyses::insert(conn, &to_insert))
            .await?;
        self.ledger.increment(identity).await?;
        let usage = self.ledger.snapshot(identity, tier).await?;

        tracing::info!(
            id = %record.id,
            url = %record.url,
            device = %device,
            performance = record.result.performance_score,
            "分析完成"
        );
        Ok(AnalysisOutcome { record, usage })
    }

    /// 调用者今日用量
    pub async fn usage_snapshot(&self, identity: &Identity) -> anyhow::Result<UsageSnapshot> {
        let tier = self.resolve_tier(identity).await?;
        self.ledger.snapshot(identity, tier).await
    }

    /// 用户的历史分析（页码从 1 开始，0 视为 1）
    pub async fn history(&self, user_id: &str, page: u32) -> anyhow::Result<HistoryPage> {
        let page = page.max(1);
        let offset = u64::from(page - 1) * u64::from(HISTORY_PAGE_SIZE);
        let user_id = user_id.to_string();

        let (total, analyses) = self
            .db
            .call(move |conn| {
                let total = store::analyses::count_for_user(conn, &user_id)?;
                let analyses =
                    store::analyses::list_for_user(conn, &user_id, HISTORY_PAGE_SIZE, offset)?;
                Ok((total, analyses))
            })
            .await?;

        Ok(HistoryPage {
            analyses,
            pagination: Pagination {
                page,
                page_size: HISTORY_PAGE_SIZE,
                total,
                pages: total.div_ceil(u64::from(HISTORY_PAGE_SIZE)),
            },
        })
    }
}

/// 只接受 http/https 的绝对 URL，返回去掉首尾空白后的原始字符串
fn validate_url(raw: &str) -> Result<String, AnalyzeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AnalyzeError::InvalidInput("URL is required".to_string()));
    }
    let parsed = reqwest::Url::parse(trimmed)
        .map_err(|_| AnalyzeError::InvalidInput("Invalid URL format".to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(AnalyzeError::InvalidInput("Invalid URL format".to_string()));
    }
    Ok(trimmed.to_string())
}

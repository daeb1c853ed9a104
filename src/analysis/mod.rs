//! 分析请求编排：身份 → 等级 → 配额 → 外部分析 → 持久化 → 计数

mod error;
mod service;

pub use error::AnalyzeError;
pub use service::{AnalysisOutcome, AnalysisService, HISTORY_PAGE_SIZE, HistoryPage};

//! Google PageSpeed Insights 集成
//!
//! - `types`: PSI v5 响应结构
//! - `normalize`: 将响应归一化为扁平的分数/指标/评级
//! - `client`: 外部分析器抽象与 HTTP 实现
//! - `vitals`: 本地 Core Web Vitals 阈值表（仅供展示）

pub mod client;
pub mod normalize;
pub mod types;
pub mod vitals;

pub use client::{Analyzer, PsiClient, PsiError};
pub use normalize::normalize;

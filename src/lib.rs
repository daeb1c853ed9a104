//! PageSpeed 分析服务
//!
//! 代替用户调用 Google PageSpeed Insights，保存归一化后的分数，
//! 并按订阅状态执行每日用量配额。

pub mod admin;
pub mod analysis;
pub mod api;
pub mod billing;
pub mod common;
pub mod http_client;
pub mod model;
pub mod pagespeed;
pub mod store;
pub mod usage;

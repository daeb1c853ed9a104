//! 领域数据模型与配置

pub mod analysis;
pub mod config;
pub mod identity;
pub mod subscription;

//! Stripe 订阅状态机
//!
//! - `signature`: `Stripe-Signature` 头校验
//! - `event`: webhook 事件解析
//! - `service`: 根据事件迁移订阅者状态

pub mod event;
pub mod service;
pub mod signature;

pub use event::BillingEvent;
pub use service::{BillingError, BillingOutcome, SubscriptionService};

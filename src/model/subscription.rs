//! 订阅状态与配额等级

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 订阅者状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    Free,
    Active,
    PastDue,
    Canceled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
        }
    }

    /// 订阅状态决定配额等级：只有 active 享受无限额度
    pub fn tier(&self) -> Tier {
        match self {
            Self::Active => Tier::Active,
            Self::Free | Self::PastDue | Self::Canceled => Tier::Free,
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "active" => Ok(Self::Active),
            "past_due" => Ok(Self::PastDue),
            "canceled" => Ok(Self::Canceled),
            other => Err(anyhow::anyhow!("未知的订阅状态: {}", other)),
        }
    }
}

/// 配额等级
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Free,
    Active,
}

impl Tier {
    pub fn is_paid(&self) -> bool {
        matches!(self, Self::Active)
    }
}

//! 每日用量账本
//!
//! 按 (身份, 服务器本地日期) 计数。配额随日期自然重置，`reset_for_date`
//! 只用于定时任务回收过期行。
//!
//! 配额检查与自增不是原子的一对操作：并发请求可能同时通过边界检查，
//! 导致在边界处略微超额，这是可接受的软限制。自增本身是原子的。

use anyhow::Result;
use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::model::identity::Identity;
use crate::model::subscription::Tier;
use crate::store::{self, Database};

/// 用量快照（`limit = -1` 表示不限量）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    pub current: u32,
    pub limit: i64,
    pub is_paid: bool,
}

/// 不限量的哨兵值
pub const UNLIMITED: i64 = -1;

#[derive(Clone)]
pub struct UsageLedger {
    db: Database,
    free_daily_limit: u32,
}

impl UsageLedger {
    pub fn new(db: Database, free_daily_limit: u32) -> Self {
        Self {
            db,
            free_daily_limit,
        }
    }

    /// 服务器本地时区的今天
    pub fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    /// 等级对应的每日上限，None 表示不限量
    pub fn limit_for(&self, tier: Tier) -> Option<u32> {
        match tier {
            Tier::Active => None,
            Tier::Free => Some(self.free_daily_limit),
        }
    }

    /// 今天的用量；未知身份恒为 0
    pub async fn usage_today(&self, identity: &Identity) -> Result<u32> {
        self.usage_on(identity, Self::today()).await
    }

    pub async fn usage_on(&self, identity: &Identity, day: NaiveDate) -> Result<u32> {
        let Some(key) = identity.usage_key() else {
            return Ok(0);
        };
        self.db
            .call(move |conn| store::usage::count_for(conn, &key, day))
            .await
    }

    /// 是否允许再做一次分析
    pub async fn allowed(&self, identity: &Identity, tier: Tier) -> Result<bool> {
        match self.limit_for(tier) {
            None => Ok(true),
            Some(limit) => Ok(self.usage_today(identity).await? < limit),
        }
    }

    /// 今天的计数加一，返回新计数；未知身份不计量，返回 0
    pub async fn increment(&self, identity: &Identity) -> Result<u32> {
        let Some(key) = identity.usage_key() else {
            return Ok(0);
        };
        let day = Self::today();
        self.db
            .call(move |conn| store::usage::increment(conn, &key, day))
            .await
    }

    /// 删除指定日期的全部计数，返回删除行数
    pub async fn reset_for_date(&self, day: NaiveDate) -> Result<usize> {
        let deleted = self
            .db
            .call(move |conn| store::usage::delete_day(conn, day))
            .await?;
        tracing::info!(day = %day, deleted, "已清理用量记录");
        Ok(deleted)
    }

    pub async fn snapshot(&self, identity: &Identity, tier: Tier) -> Result<UsageSnapshot> {
        let current = self.usage_today(identity).await?;
        Ok(UsageSnapshot {
            current,
            limit: self.limit_for(tier).map(i64::from).unwrap_or(UNLIMITED),
            is_paid: tier.is_paid(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> UsageLedger {
        UsageLedger::new(Database::open_in_memory().unwrap(), 5)
    }

    fn ip(addr: &str) -> Identity {
        Identity::Address(addr.to_string())
    }

    #[tokio::test]
    async fn test_free_tier_boundary() {
        let ledger = ledger();
        let who = Identity::User("u1".to_string());

        for n in 0..5 {
            assert_eq!(ledger.usage_today(&who).await.unwrap(), n);
            assert!(ledger.allowed(&who, Tier::Free).await.unwrap(), "n = {}", n);
            ledger.increment(&who).await.unwrap();
        }
        assert_eq!(ledger.usage_today(&who).await.unwrap(), 5);
        assert!(!ledger.allowed(&who, Tier::Free).await.unwrap());

        ledger.increment(&who).await.unwrap();
        assert!(!ledger.allowed(&who, Tier::Free).await.unwrap());
    }

    #[tokio::test]
    async fn test_active_tier_is_unlimited() {
        let ledger = ledger();
        let who = ip("203.0.113.7");
        for _ in 0..12 {
            ledger.increment(&who).await.unwrap();
        }
        assert!(ledger.allowed(&who, Tier::Active).await.unwrap());
        assert!(!ledger.allowed(&who, Tier::Free).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_identity_is_untracked() {
        let ledger = ledger();
        assert_eq!(ledger.increment(&Identity::Unknown).await.unwrap(), 0);
        assert_eq!(ledger.usage_today(&Identity::Unknown).await.unwrap(), 0);
        assert!(ledger.allowed(&Identity::Unknown, Tier::Free).await.unwrap());
    }

    #[tokio::test]
    async fn test_identities_are_counted_separately() {
        let ledger = ledger();
        ledger.increment(&ip("1.1.1.1")).await.unwrap();
        ledger.increment(&ip("1.1.1.1")).await.unwrap();
        ledger.increment(&Identity::User("1.1.1.1".to_string())).await.unwrap();

        assert_eq!(ledger.usage_today(&ip("1.1.1.1")).await.unwrap(), 2);
        assert_eq!(
            ledger
                .usage_today(&Identity::User("1.1.1.1".to_string()))
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_lose_no_updates() {
        let ledger = ledger();
        let who = ip("198.51.100.1");

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let ledger = ledger.clone();
                let who = who.clone();
                tokio::spawn(async move { ledger.increment(&who).await.unwrap() })
            })
            .collect();

        let mut returned = Vec::new();
        for handle in handles {
            returned.push(handle.await.unwrap());
        }
        returned.sort_unstable();

        assert_eq!(ledger.usage_today(&who).await.unwrap(), 50);
        // 每次自增看到的计数各不相同
        assert_eq!(returned, (1..=50).collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn test_reset_for_date_only_touches_that_day() {
        let ledger = ledger();
        let who = ip("192.0.2.1");
        let today = UsageLedger::today();
        let yesterday = today.pred_opt().unwrap();

        ledger.increment(&who).await.unwrap();
        let key = who.usage_key().unwrap();
        ledger
            .db
            .call(move |conn| store::usage::increment(conn, &key, yesterday))
            .await
            .unwrap();

        assert_eq!(ledger.reset_for_date(yesterday).await.unwrap(), 1);
        assert_eq!(ledger.usage_on(&who, yesterday).await.unwrap(), 0);
        assert_eq!(ledger.usage_today(&who).await.unwrap(), 1);

        ledger.reset_for_date(today).await.unwrap();
        assert_eq!(ledger.usage_today(&who).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_snapshot_limits() {
        let ledger = ledger();
        let who = ip("192.0.2.2");
        ledger.increment(&who).await.unwrap();

        let free = ledger.snapshot(&who, Tier::Free).await.unwrap();
        assert_eq!(
            free,
            UsageSnapshot {
                current: 1,
                limit: 5,
                is_paid: false
            }
        );

        let paid = ledger.snapshot(&who, Tier::Active).await.unwrap();
        assert_eq!(paid.limit, UNLIMITED);
        assert!(paid.is_paid);
    }
}

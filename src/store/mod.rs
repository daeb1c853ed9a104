//! SQLite 持久化层
//!
//! 单个连接由 `parking_lot::Mutex` 保护，所有 SQL 通过 `spawn_blocking` 执行，
//! 避免阻塞 tokio 工作线程。各子模块只提供同步函数，由上层服务负责调度。

pub mod analyses;
pub mod subscribers;
pub mod usage;

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::Connection;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS subscribers (
    user_id TEXT PRIMARY KEY,
    email TEXT,
    stripe_customer_id TEXT UNIQUE,
    stripe_subscription_id TEXT UNIQUE,
    subscription_status TEXT NOT NULL DEFAULT 'free',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS analyses (
    id TEXT PRIMARY KEY,
    user_id TEXT,
    url TEXT NOT NULL,
    device_type TEXT NOT NULL,
    performance_score INTEGER NOT NULL,
    accessibility_score INTEGER NOT NULL,
    best_practices_score INTEGER NOT NULL,
    seo_score INTEGER NOT NULL,
    speed_index REAL,
    lcp REAL,
    cls REAL,
    inp REAL,
    fcp REAL,
    ttfb REAL,
    lcp_rating TEXT,
    cls_rating TEXT,
    inp_rating TEXT,
    fcp_rating TEXT,
    ttfb_rating TEXT,
    lighthouse_json TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_analyses_user_created ON analyses(user_id, created_at);

CREATE TABLE IF NOT EXISTS usage_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    identity TEXT NOT NULL,
    day TEXT NOT NULL,
    count INTEGER NOT NULL DEFAULT 0,
    UNIQUE(identity, day)
);
CREATE INDEX IF NOT EXISTS idx_usage_day ON usage_logs(day);
";

/// 数据库句柄（可廉价克隆，启动时创建一次后注入各服务）
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// 打开数据库文件并建表
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("打开数据库失败: {}", path.display()))?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::init(conn)
    }

    /// 内存数据库（测试用）
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA).context("初始化数据库表结构失败")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 在阻塞线程池中执行同步数据库操作
    pub async fn call<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard)
        })
        .await?
    }
}

/// 将文本列解析为领域枚举
pub(crate) fn parse_column<T>(idx: usize, value: String) -> rusqlite::Result<T>
where
    T: FromStr<Err = anyhow::Error>,
{
    value.parse().map_err(|e: anyhow::Error| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}

/// 可空文本列解析
pub(crate) fn parse_optional_column<T>(idx: usize, value: Option<String>) -> rusqlite::Result<Option<T>>
where
    T: FromStr<Err = anyhow::Error>,
{
    value.map(|v| parse_column(idx, v)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await
        .unwrap();

        let tables: i64 = db
            .call(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('subscribers', 'analyses', 'usage_logs')",
                    [],
                    |row| row.get(0),
                )?)
            })
            .await
            .unwrap();
        assert_eq!(tables, 3);
    }
}

//! 每日用量计数表
//!
//! 每个 (identity, day) 至多一行，计数只增不减

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};

/// 用量表中的日期键
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// 查询某身份某天的计数，没有记录时返回 0
pub fn count_for(conn: &Connection, identity: &str, day: NaiveDate) -> Result<u32> {
    let count: Option<u32> = conn
        .query_row(
            "SELECT count FROM usage_logs WHERE identity = ?1 AND day = ?2",
            params![identity, day_key(day)],
            |row| row.get(0),
        )
        .optional()?;
    Ok(count.unwrap_or(0))
}

/// 原子自增（不存在时以 1 创建），返回自增后的计数
///
/// 单条 upsert 语句完成，并发自增不会丢失更新
pub fn increment(conn: &Connection, identity: &str, day: NaiveDate) -> Result<u32> {
    let count = conn.query_row(
        "INSERT INTO usage_logs (identity, day, count) VALUES (?1, ?2, 1)
         ON CONFLICT(identity, day) DO UPDATE SET count = count + 1
         RETURNING count",
        params![identity, day_key(day)],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// 删除某一天的全部计数，返回删除行数
pub fn delete_day(conn: &Connection, day: NaiveDate) -> Result<usize> {
    Ok(conn.execute("DELETE FROM usage_logs WHERE day = ?1", params![day_key(day)])?)
}

//! 订阅者表

use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;

use super::parse_column;
use crate::model::subscription::SubscriptionStatus;

/// 订阅者记录
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub user_id: String,
    pub email: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub status: SubscriptionStatus,
    pub created_at: String,
    pub updated_at: String,
}

const COLUMNS: &str = "user_id, email, stripe_customer_id, stripe_subscription_id, subscription_status, created_at, updated_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Subscriber> {
    Ok(Subscriber {
        user_id: row.get(0)?,
        email: row.get(1)?,
        stripe_customer_id: row.get(2)?,
        stripe_subscription_id: row.get(3)?,
        status: parse_column(4, row.get(4)?)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn find_one(conn: &Connection, column: &str, value: &str) -> Result<Option<Subscriber>> {
    let sql = format!("SELECT {} FROM subscribers WHERE {} = ?1", COLUMNS, column);
    Ok(conn.query_row(&sql, [value], from_row).optional()?)
}

pub fn get(conn: &Connection, user_id: &str) -> Result<Option<Subscriber>> {
    find_one(conn, "user_id", user_id)
}

pub fn find_by_customer(conn: &Connection, customer_id: &str) -> Result<Option<Subscriber>> {
    find_one(conn, "stripe_customer_id", customer_id)
}

pub fn find_by_subscription(conn: &Connection, subscription_id: &str) -> Result<Option<Subscriber>> {
    find_one(conn, "stripe_subscription_id", subscription_id)
}

pub fn list(conn: &Connection) -> Result<Vec<Subscriber>> {
    let sql = format!("SELECT {} FROM subscribers ORDER BY created_at ASC", COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// 创建订阅者或更新其关联信息（新行状态为 free，已有行状态不变）
pub fn upsert_link(
    conn: &Connection,
    user_id: &str,
    email: Option<&str>,
    customer_id: Option<&str>,
) -> Result<Subscriber> {
    let ts = now();
    let sql = format!(
        "INSERT INTO subscribers (user_id, email, stripe_customer_id, subscription_status, created_at, updated_at)
         VALUES (?1, ?2, ?3, 'free', ?4, ?4)
         ON CONFLICT(user_id) DO UPDATE SET
             email = COALESCE(excluded.email, email),
             stripe_customer_id = COALESCE(excluded.stripe_customer_id, stripe_customer_id),
             updated_at = excluded.updated_at
         RETURNING {}",
        COLUMNS
    );
    Ok(conn.query_row(&sql, params![user_id, email, customer_id, ts], from_row)?)
}

/// 同时设置订阅 ID 与状态，返回受影响行数
pub fn set_subscription(
    conn: &Connection,
    user_id: &str,
    subscription_id: Option<&str>,
    status: SubscriptionStatus,
) -> Result<usize> {
    Ok(conn.execute(
        "UPDATE subscribers SET stripe_subscription_id = ?2, subscription_status = ?3, updated_at = ?4
         WHERE user_id = ?1",
        params![user_id, subscription_id, status.as_str(), now()],
    )?)
}

/// 仅设置状态，返回受影响行数
pub fn set_status(conn: &Connection, user_id: &str, status: SubscriptionStatus) -> Result<usize> {
    Ok(conn.execute(
        "UPDATE subscribers SET subscription_status = ?2, updated_at = ?3 WHERE user_id = ?1",
        params![user_id, status.as_str(), now()],
    )?)
}

//! 分析记录表（只插入，不修改）

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, Row, params};

use super::{parse_column, parse_optional_column};
use crate::model::analysis::{AnalysisRecord, AnalysisResult, Rating};

const COLUMNS: &str = "id, user_id, url, device_type,
    performance_score, accessibility_score, best_practices_score, seo_score,
    speed_index, lcp, cls, inp, fcp, ttfb,
    lcp_rating, cls_rating, inp_rating, fcp_rating, ttfb_rating,
    lighthouse_json, created_at";

fn rating_str(rating: Option<Rating>) -> Option<&'static str> {
    rating.map(|r| r.as_str())
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<AnalysisRecord> {
    let created_at: String = row.get(20)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(20, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(AnalysisRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        url: row.get(2)?,
        device_type: parse_column(3, row.get(3)?)?,
        result: AnalysisResult {
            performance_score: row.get(4)?,
            accessibility_score: row.get(5)?,
            best_practices_score: row.get(6)?,
            seo_score: row.get(7)?,
            speed_index: row.get(8)?,
            lcp: row.get(9)?,
            cls: row.get(10)?,
            inp: row.get(11)?,
            fcp: row.get(12)?,
            ttfb: row.get(13)?,
            lcp_rating: parse_optional_column(14, row.get(14)?)?,
            cls_rating: parse_optional_column(15, row.get(15)?)?,
            inp_rating: parse_optional_column(16, row.get(16)?)?,
            fcp_rating: parse_optional_column(17, row.get(17)?)?,
            ttfb_rating: parse_optional_column(18, row.get(18)?)?,
        },
        lighthouse_json: row.get(19)?,
        created_at,
    })
}

pub fn insert(conn: &Connection, record: &AnalysisRecord) -> Result<()> {
    let r = &record.result;
    conn.execute(
        &format!(
            "INSERT INTO analyses ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
            COLUMNS
        ),
        params![
            record.id,
            record.user_id,
            record.url,
            record.device_type.as_str(),
            r.performance_score,
            r.accessibility_score,
            r.best_practices_score,
            r.seo_score,
            r.speed_index,
            r.lcp,
            r.cls,
            r.inp,
            r.fcp,
            r.ttfb,
            rating_str(r.lcp_rating),
            rating_str(r.cls_rating),
            rating_str(r.inp_rating),
            rating_str(r.fcp_rating),
            rating_str(r.ttfb_rating),
            record.lighthouse_json,
            record.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
        ],
    )?;
    Ok(())
}

pub fn count_for_user(conn: &Connection, user_id: &str) -> Result<u64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM analyses WHERE user_id = ?1",
        [user_id],
        |row| row.get(0),
    )?)
}

/// 分页查询用户的分析记录（按创建时间倒序）
pub fn list_for_user(
    conn: &Connection,
    user_id: &str,
    limit: u32,
    offset: u64,
) -> Result<Vec<AnalysisRecord>> {
    let sql = format!(
        "SELECT {} FROM analyses WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT ?2 OFFSET ?3",
        COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let records = stmt
        .query_map(params![user_id, limit as i64, offset as i64], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::analysis::DeviceType;
    use crate::store::Database;

    fn record(id: &str, user: Option<&str>, created_at: DateTime<Utc>) -> AnalysisRecord {
        AnalysisRecord {
            id: id.to_string(),
            user_id: user.map(str::to_string),
            url: "https://example.com".to_string(),
            device_type: DeviceType::Desktop,
            result: AnalysisResult {
                performance_score: 87,
                lcp: Some(2200.0),
                lcp_rating: Some(Rating::Good),
                cls_rating: Some(Rating::NeedsImprovement),
                ..AnalysisResult::default()
            },
            lighthouse_json: None,
            created_at,
        }
    }

    #[tokio::test]
    async fn test_insert_and_list_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let base = Utc::now();
        let (total, page) = db
            .call(move |conn| {
                insert(conn, &record("a", Some("u1"), base - chrono::Duration::minutes(2)))?;
                insert(conn, &record("b", Some("u1"), base - chrono::Duration::minutes(1)))?;
                insert(conn, &record("c", Some("u1"), base))?;
                insert(conn, &record("d", None, base))?;
                Ok((
                    count_for_user(conn, "u1")?,
                    list_for_user(conn, "u1", 2, 0)?,
                ))
            })
            .await
            .unwrap();

        assert_eq!(total, 3);
        let ids: Vec<_> = page.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);

        let first = &page[0];
        assert_eq!(first.device_type, DeviceType::Desktop);
        assert_eq!(first.result.performance_score, 87);
        assert_eq!(first.result.lcp, Some(2200.0));
        assert_eq!(first.result.cls, None);
        assert_eq!(first.result.lcp_rating, Some(Rating::Good));
        assert_eq!(first.result.cls_rating, Some(Rating::NeedsImprovement));
        assert_eq!(first.result.ttfb_rating, None);
    }
}

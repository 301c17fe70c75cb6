use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;

use folio_core::domain::VisitRecord;

#[derive(Debug, Error)]
pub enum VisitsRepoError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Debug, Clone)]
pub struct NewVisit {
    pub ip_address: String,
    pub page: String,
    pub user_agent: Option<String>,
    pub session_id: Option<String>,
    pub visited_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct VisitRow {
    ip_address: String,
    page: String,
    user_agent: Option<String>,
    session_id: Option<String>,
    visited_at: DateTime<Utc>,
}

impl From<VisitRow> for VisitRecord {
    fn from(row: VisitRow) -> Self {
        VisitRecord {
            ip_address: row.ip_address,
            page: row.page,
            user_agent: row.user_agent,
            session_id: row.session_id,
            visited_at: row.visited_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VisitLogEntry {
    pub id: i64,
    pub ip_address: String,
    pub page: String,
    pub user_agent: Option<String>,
    pub session_id: Option<String>,
    pub visited_at: DateTime<Utc>,
}

/// Stores a visit unless the same IP already hit the same page within
/// `dedup_window` before `visit.visited_at`. Returns whether a row was
/// written.
pub async fn record_visit(
    pool: &PgPool,
    visit: &NewVisit,
    dedup_window: Duration,
) -> Result<bool, VisitsRepoError> {
    let window_secs = dedup_window.as_secs_f64();
    let result = sqlx::query(
        r#"
        INSERT INTO visitor_logs (ip_address, page, user_agent, session_id, visited_at)
        SELECT $1, $2, $3, $4, $5
        WHERE NOT EXISTS (
            SELECT 1
            FROM visitor_logs
            WHERE ip_address = $1
              AND page = $2
              AND visited_at > $5 - make_interval(secs => $6)
              AND visited_at <= $5
        )
        "#,
    )
    .bind(&visit.ip_address)
    .bind(&visit.page)
    .bind(visit.user_agent.as_deref())
    .bind(visit.session_id.as_deref())
    .bind(visit.visited_at)
    .bind(window_secs)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Visits with `from <= visited_at <= to`, oldest first, at most `limit`.
pub async fn fetch_visits(
    pool: &PgPool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<VisitRecord>, VisitsRepoError> {
    let rows = sqlx::query_as::<_, VisitRow>(
        r#"
        SELECT ip_address, page, user_agent, session_id, visited_at
        FROM visitor_logs
        WHERE visited_at BETWEEN $1 AND $2
        ORDER BY visited_at ASC, id ASC
        LIMIT $3
        "#,
    )
    .bind(from)
    .bind(to)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(VisitRecord::from).collect())
}

pub async fn list_recent_visits(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<VisitLogEntry>, VisitsRepoError> {
    let rows = sqlx::query_as::<_, VisitLogEntry>(
        r#"
        SELECT id, ip_address, page, user_agent, session_id, visited_at
        FROM visitor_logs
        ORDER BY visited_at DESC, id DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn prune_visits_before(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<u64, VisitsRepoError> {
    let result = sqlx::query(
        r#"
        DELETE FROM visitor_logs
        WHERE visited_at < $1
        "#,
    )
    .bind(cutoff)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

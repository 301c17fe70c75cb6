use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::state::AppState;
use folio_core::analytics::VisitorStatsAggregator;
use folio_core::domain::StatsReport;
use folio_core::error::CoreError;
use folio_core::types::StatsPeriod;
use folio_infra::db::{fetch_visits, list_recent_visits, VisitLogEntry, VisitsRepoError};

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct VisitorStatsQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VisitorListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct VisitorListResponse {
    total: usize,
    items: Vec<VisitLogEntry>,
}

#[derive(Debug, Error)]
pub enum VisitorAdminError {
    #[error("{0}")]
    InvalidPeriod(#[from] CoreError),
    #[error("db not configured")]
    DbUnavailable,
    #[error("db error: {0}")]
    Db(#[from] VisitsRepoError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub async fn get_visitor_stats(
    State(state): State<AppState>,
    Query(query): Query<VisitorStatsQuery>,
) -> Result<Json<StatsReport>, VisitorAdminError> {
    let offset = state.config.utc_offset;
    let today = Utc::now().with_timezone(&offset).date_naive();
    let period = StatsPeriod::resolve(query.from.as_deref(), query.to.as_deref(), today)?;
    let pool = state.db.as_ref().ok_or(VisitorAdminError::DbUnavailable)?;

    let (from, to) = period.utc_bounds(offset);
    let limit = state.config.stats_max_records;
    let records = fetch_visits(pool, from, to, limit).await?;
    if is_truncated(records.len(), limit) {
        warn!(
            limit,
            start = %period.start,
            end = %period.end,
            "visitor stats window hit the record cap; report is partial"
        );
    }

    let report = VisitorStatsAggregator::new(period)
        .with_offset(offset)
        .aggregate(&records);
    info!(
        start = %period.start,
        end = %period.end,
        visits = report.total_visitors,
        unique = report.unique_visitors,
        sessions = report.total_sessions,
        "visitor stats aggregated"
    );
    Ok(Json(report))
}

pub async fn list_visitors(
    State(state): State<AppState>,
    Query(query): Query<VisitorListQuery>,
) -> Result<Json<VisitorListResponse>, VisitorAdminError> {
    let limit = clamp_limit(query.limit);
    let pool = state.db.as_ref().ok_or(VisitorAdminError::DbUnavailable)?;
    let items = list_recent_visits(pool, limit).await?;
    Ok(Json(VisitorListResponse {
        total: items.len(),
        items,
    }))
}

fn is_truncated(fetched: usize, limit: i64) -> bool {
    i64::try_from(fetched).map_or(true, |fetched| fetched >= limit)
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    match limit {
        Some(value) if value > 0 => value.min(MAX_LIST_LIMIT),
        _ => DEFAULT_LIST_LIMIT,
    }
}

impl IntoResponse for VisitorAdminError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            VisitorAdminError::InvalidPeriod(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            VisitorAdminError::DbUnavailable => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            VisitorAdminError::Db(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };
        let body = Json(ErrorBody { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use super::{clamp_limit, is_truncated, VisitorAdminError};
    use folio_core::error::CoreError;

    #[test]
    fn clamp_limit_defaults_and_caps() {
        assert_eq!(clamp_limit(None), 50);
        assert_eq!(clamp_limit(Some(0)), 50);
        assert_eq!(clamp_limit(Some(-3)), 50);
        assert_eq!(clamp_limit(Some(20)), 20);
        assert_eq!(clamp_limit(Some(10_000)), 500);
    }

    #[test]
    fn truncation_detected_at_cap() {
        assert!(!is_truncated(4999, 5000));
        assert!(is_truncated(5000, 5000));
    }

    #[test]
    fn invalid_period_maps_to_bad_request() {
        let err = VisitorAdminError::from(CoreError::InvalidPeriod("2024-02-01~2024-01-01".into()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_db_maps_to_unavailable() {
        let response = VisitorAdminError::DbUnavailable.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}

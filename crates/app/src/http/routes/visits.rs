use std::net::{IpAddr, SocketAddr};

use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::state::AppState;
use folio_core::error::CoreError;
use folio_core::types::PagePath;
use folio_infra::db::{record_visit, NewVisit, VisitsRepoError};

const MAX_SESSION_ID_LEN: usize = 128;
const MAX_USER_AGENT_LEN: usize = 512;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordVisitRequest {
    pub page: Option<String>,
    pub session_id: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecordVisitResponse {
    pub recorded: bool,
}

#[derive(Debug, Error)]
pub enum VisitApiError {
    #[error("page is required")]
    MissingPage,
    #[error("page is invalid")]
    InvalidPage(#[from] CoreError),
    #[error("sessionId is invalid")]
    InvalidSessionId,
    #[error("invalid payload")]
    InvalidPayload,
    #[error("db not configured")]
    DbUnavailable,
    #[error("db error: {0}")]
    Db(#[from] VisitsRepoError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub async fn post_visit(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<RecordVisitResponse>), VisitApiError> {
    let payload: RecordVisitRequest = parse_json(&body)?;
    let raw_page = payload.page.as_deref().ok_or(VisitApiError::MissingPage)?;
    let page = PagePath::normalize(raw_page)?;
    let session_id = normalize_session_id(payload.session_id.as_deref())?;
    let user_agent = payload
        .user_agent
        .as_deref()
        .or_else(|| header_value(&headers, USER_AGENT.as_str()))
        .and_then(truncate_user_agent);
    let ip_address = client_ip(&headers, peer);

    let pool = state.db.as_ref().ok_or(VisitApiError::DbUnavailable)?;
    let visit = NewVisit {
        ip_address,
        page: page.into_string(),
        user_agent,
        session_id,
        visited_at: Utc::now(),
    };
    let recorded = record_visit(pool, &visit, state.config.dedup_window).await?;
    debug!(page = %visit.page, recorded, "visit received");
    Ok((StatusCode::ACCEPTED, Json(RecordVisitResponse { recorded })))
}

fn parse_json<T>(body: &Bytes) -> Result<T, VisitApiError>
where
    T: DeserializeOwned,
{
    if body.is_empty() {
        return Err(VisitApiError::InvalidPayload);
    }
    serde_json::from_slice(body).map_err(|_| VisitApiError::InvalidPayload)
}

fn normalize_session_id(value: Option<&str>) -> Result<Option<String>, VisitApiError> {
    let trimmed = value.unwrap_or("").trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.len() > MAX_SESSION_ID_LEN
        || trimmed.chars().any(|ch| ch.is_whitespace() || ch.is_control())
    {
        return Err(VisitApiError::InvalidSessionId);
    }
    Ok(Some(trimmed.to_string()))
}

fn truncate_user_agent(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_USER_AGENT_LEN).collect())
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

/// First `x-forwarded-for` hop, then `x-real-ip`, then the socket peer.
fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    let forwarded = header_value(headers, "x-forwarded-for")
        .and_then(|value| value.split(',').next())
        .and_then(parse_ip);
    let real_ip = || header_value(headers, "x-real-ip").and_then(parse_ip);
    forwarded
        .or_else(real_ip)
        .unwrap_or_else(|| peer.ip())
        .to_string()
}

fn parse_ip(value: &str) -> Option<IpAddr> {
    value.trim().parse().ok()
}

impl IntoResponse for VisitApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            VisitApiError::MissingPage
            | VisitApiError::InvalidPage(_)
            | VisitApiError::InvalidSessionId
            | VisitApiError::InvalidPayload => (StatusCode::BAD_REQUEST, self.to_string()),
            VisitApiError::DbUnavailable => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            VisitApiError::Db(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };
        let body = Json(ErrorBody { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::body::Bytes;
    use axum::http::HeaderMap;

    use super::{client_ip, normalize_session_id, parse_json, truncate_user_agent, RecordVisitRequest};

    fn peer() -> SocketAddr {
        "10.0.0.9:51000".parse().unwrap()
    }

    #[test]
    fn client_ip_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        headers.insert("x-real-ip", "198.51.100.2".parse().unwrap());
        assert_eq!(client_ip(&headers, peer()), "203.0.113.7");
    }

    #[test]
    fn client_ip_falls_back_to_real_ip_then_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "not-an-ip".parse().unwrap());
        headers.insert("x-real-ip", "198.51.100.2".parse().unwrap());
        assert_eq!(client_ip(&headers, peer()), "198.51.100.2");
        assert_eq!(client_ip(&HeaderMap::new(), peer()), "10.0.0.9");
    }

    #[test]
    fn session_id_blank_is_none() {
        assert_eq!(normalize_session_id(None).unwrap(), None);
        assert_eq!(normalize_session_id(Some("  ")).unwrap(), None);
        assert_eq!(
            normalize_session_id(Some(" abc123 ")).unwrap(),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn session_id_rejects_whitespace_and_overlong() {
        assert!(normalize_session_id(Some("a b")).is_err());
        assert!(normalize_session_id(Some(&"x".repeat(129))).is_err());
    }

    #[test]
    fn user_agent_is_truncated() {
        let long = "a".repeat(600);
        assert_eq!(truncate_user_agent(&long).unwrap().len(), 512);
        assert!(truncate_user_agent("   ").is_none());
    }

    #[test]
    fn parse_json_reads_camel_case() {
        let body = Bytes::from_static(br#"{"page":"/about","sessionId":"s1"}"#);
        let payload: RecordVisitRequest = parse_json(&body).unwrap();
        assert_eq!(payload.page.as_deref(), Some("/about"));
        assert_eq!(payload.session_id.as_deref(), Some("s1"));
        assert!(payload.user_agent.is_none());
    }

    #[test]
    fn parse_json_rejects_empty_body() {
        assert!(parse_json::<RecordVisitRequest>(&Bytes::new()).is_err());
    }
}

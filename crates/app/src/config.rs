use std::net::SocketAddr;
use std::time::Duration;

use chrono::FixedOffset;
use thiserror::Error;

use folio_infra::db::DEFAULT_MAX_CONNECTIONS;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: SocketAddr,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub cors_allow_origins: Vec<String>,
    pub dedup_window: Duration,
    pub stats_max_records: i64,
    pub utc_offset: FixedOffset,
    pub retention_days: u32,
    pub retention_interval: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid socket address: {0}")]
    InvalidSocket(String),
    #[error("invalid integer for {0}: {1}")]
    InvalidNumber(&'static str, String),
    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
    #[error("dotenv error: {0}")]
    Dotenv(#[from] dotenvy::Error),
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_addr_raw = read_string("FOLIO_HTTP_ADDR", "127.0.0.1:8080");
        let http_addr = http_addr_raw
            .parse()
            .map_err(|_| ConfigError::InvalidSocket(http_addr_raw.clone()))?;
        let database_url = read_optional_string("FOLIO_DATABASE_URL");
        let db_max_connections =
            read_number("FOLIO_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        let cors_allow_origins = parse_origins(&read_string("FOLIO_CORS_ALLOW_ORIGINS", ""));
        let dedup_window_secs = read_number("FOLIO_DEDUP_WINDOW_SECS", 3600u64)?;
        let stats_max_records = read_number("FOLIO_STATS_MAX_RECORDS", 5000i64)?;
        if stats_max_records <= 0 {
            return Err(ConfigError::InvalidValue(
                "FOLIO_STATS_MAX_RECORDS",
                stats_max_records.to_string(),
            ));
        }
        let offset_minutes = read_number("FOLIO_UTC_OFFSET_MINUTES", 0i32)?;
        let utc_offset = offset_from_minutes(offset_minutes).ok_or_else(|| {
            ConfigError::InvalidValue("FOLIO_UTC_OFFSET_MINUTES", offset_minutes.to_string())
        })?;
        let retention_days = read_number("FOLIO_RETENTION_DAYS", 0u32)?;
        let retention_interval_secs = read_number("FOLIO_RETENTION_INTERVAL_SECS", 3600u64)?;

        Ok(Self {
            http_addr,
            database_url,
            db_max_connections,
            cors_allow_origins,
            dedup_window: Duration::from_secs(dedup_window_secs),
            stats_max_records,
            utc_offset,
            retention_days,
            retention_interval: Duration::from_secs(retention_interval_secs),
        })
    }
}

/// Loads `.env` from the working directory if present. Variables already set
/// in the environment win.
pub fn load_dotenv() -> Result<(), ConfigError> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn read_string(key: &'static str, default: &'static str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn read_number<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + ToString,
{
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber(key, raw))
}

fn read_optional_string(key: &'static str) -> Option<String> {
    let value = std::env::var(key).unwrap_or_default();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}

#[cfg(test)]
mod tests {
    use super::{offset_from_minutes, parse_origins};

    #[test]
    fn parse_origins_splits_and_trims() {
        let origins = parse_origins(" https://a.dev , ,https://b.dev");
        assert_eq!(origins, vec!["https://a.dev", "https://b.dev"]);
    }

    #[test]
    fn parse_origins_empty() {
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn offset_from_minutes_accepts_half_hours() {
        let offset = offset_from_minutes(330).unwrap();
        assert_eq!(offset.local_minus_utc(), 330 * 60);
    }

    #[test]
    fn offset_from_minutes_rejects_out_of_range() {
        assert!(offset_from_minutes(24 * 60).is_none());
        assert!(offset_from_minutes(i32::MAX).is_none());
    }
}

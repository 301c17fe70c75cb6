use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Session bucket used for visits that carry no session id.
pub const UNKNOWN_SESSION: &str = "unknown";

/// Page bucket used for visits stored with an empty path.
pub const ROOT_PAGE: &str = "/";

/// One logged page view as handed over by the visit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitRecord {
    pub ip_address: String,
    pub page: String,
    pub user_agent: Option<String>,
    pub session_id: Option<String>,
    pub visited_at: DateTime<Utc>,
}

impl VisitRecord {
    pub fn page_key(&self) -> &str {
        if self.page.is_empty() {
            ROOT_PAGE
        } else {
            &self.page
        }
    }

    pub fn session_key(&self) -> &str {
        match self.session_id.as_deref() {
            Some(value) if !value.is_empty() => value,
            _ => UNKNOWN_SESSION,
        }
    }

    /// User agent that takes part in browser / OS tallies. Absent and empty
    /// values are both skipped.
    pub fn classifiable_user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref().filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Browser {
    Edge,
    Chrome,
    Firefox,
    Safari,
    Opera,
    Unknown,
}

impl Browser {
    pub fn as_str(self) -> &'static str {
        match self {
            Browser::Edge => "Edge",
            Browser::Chrome => "Chrome",
            Browser::Firefox => "Firefox",
            Browser::Safari => "Safari",
            Browser::Opera => "Opera",
            Browser::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OsFamily {
    Windows,
    #[serde(rename = "macOS")]
    MacOs,
    Android,
    #[serde(rename = "iOS")]
    Ios,
    Linux,
    Unknown,
}

impl OsFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            OsFamily::Windows => "Windows",
            OsFamily::MacOs => "macOS",
            OsFamily::Android => "Android",
            OsFamily::Ios => "iOS",
            OsFamily::Linux => "Linux",
            OsFamily::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub period: PeriodEcho,
    pub total_visitors: u64,
    pub unique_visitors: u64,
    pub total_sessions: u64,
    pub avg_page_views: f64,
    pub avg_session_duration: u64,
    pub page_stats: Vec<PageStat>,
    pub daily_stats: Vec<DailyStat>,
    pub session_stats: Vec<SessionStat>,
    pub browser_stats: Vec<BrowserStat>,
    pub os_stats: Vec<OsStat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodEcho {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageStat {
    pub page: String,
    pub visits: u64,
    pub unique_visitors: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStat {
    pub date: NaiveDate,
    pub visits: u64,
    pub unique_visitors: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStat {
    pub session_id: String,
    pub ip_address: String,
    pub page_views: u64,
    pub unique_pages: u64,
    /// Milliseconds between the first and last visit, never negative.
    pub duration: i64,
    pub first_visit: DateTime<Utc>,
    pub last_visit: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub pages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserStat {
    pub browser: Browser,
    pub visits: u64,
    pub unique_visitors: u64,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OsStat {
    pub os: OsFamily,
    pub visits: u64,
    pub unique_visitors: u64,
    pub percentage: u32,
}

pub mod visits;

pub use visits::{
    Browser, BrowserStat, DailyStat, OsFamily, OsStat, PageStat, PeriodEcho, SessionStat,
    StatsReport, VisitRecord, ROOT_PAGE, UNKNOWN_SESSION,
};

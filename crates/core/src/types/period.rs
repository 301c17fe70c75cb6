use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::domain::PeriodEcho;
use crate::error::CoreError;

pub const DEFAULT_RANGE_DAYS: i64 = 30;

/// Inclusive calendar window the stats report covers, in the site's local
/// day boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl StatsPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::InvalidPeriod(format!("{start}~{end}")));
        }
        Ok(StatsPeriod { start, end })
    }

    /// Builds a period from optional `YYYY-MM-DD` bounds. A missing end is
    /// `today`; a missing start is thirty days before the end.
    pub fn resolve(
        from: Option<&str>,
        to: Option<&str>,
        today: NaiveDate,
    ) -> Result<Self, CoreError> {
        let end = to.map(parse_date).transpose()?.unwrap_or(today);
        let start = from
            .map(parse_date)
            .transpose()?
            .unwrap_or(end - Duration::days(DEFAULT_RANGE_DAYS));
        StatsPeriod::new(start, end)
    }

    /// First and last instant of the period, as UTC, given the offset the
    /// site's calendar days are counted in.
    pub fn utc_bounds(&self, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = local_to_utc(offset, self.start.and_time(NaiveTime::MIN));
        let end = local_to_utc(offset, end_of_day(self.end));
        (start, end)
    }

    pub fn echo(&self) -> PeriodEcho {
        PeriodEcho {
            start_date: self.start,
            end_date: self.end,
        }
    }
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    let next = date.succ_opt().map(|next| next.and_time(NaiveTime::MIN));
    match next {
        Some(next) => next - Duration::milliseconds(1),
        None => date.and_time(NaiveTime::MIN),
    }
}

fn local_to_utc(offset: FixedOffset, local: NaiveDateTime) -> DateTime<Utc> {
    // Fixed offsets never yield ambiguous or missing local times.
    match offset.from_local_datetime(&local).single() {
        Some(value) => value.with_timezone(&Utc),
        None => local.and_utc(),
    }
}

fn parse_date(input: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| CoreError::InvalidPeriod(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn resolve_defaults_to_thirty_days() {
        let period = StatsPeriod::resolve(None, None, date(2024, 3, 31)).unwrap();
        assert_eq!(period.end, date(2024, 3, 31));
        assert_eq!(period.start, date(2024, 3, 1));
    }

    #[test]
    fn resolve_start_defaults_from_explicit_end() {
        let period = StatsPeriod::resolve(None, Some("2024-02-10"), date(2024, 3, 31)).unwrap();
        assert_eq!(period.start, date(2024, 1, 11));
        assert_eq!(period.end, date(2024, 2, 10));
    }

    #[test]
    fn resolve_full_range() {
        let period =
            StatsPeriod::resolve(Some("2024-01-01"), Some("2024-01-31"), date(2024, 3, 31))
                .unwrap();
        assert_eq!(period.start, date(2024, 1, 1));
        assert_eq!(period.end, date(2024, 1, 31));
    }

    #[test]
    fn reject_inverted_range() {
        assert!(StatsPeriod::resolve(Some("2024-02-01"), Some("2024-01-01"), date(2024, 3, 1)).is_err());
    }

    #[test]
    fn reject_malformed_date() {
        assert!(StatsPeriod::resolve(Some("2024-13-01"), None, date(2024, 3, 1)).is_err());
    }

    #[test]
    fn utc_bounds_cover_whole_days() {
        let period = StatsPeriod::new(date(2024, 1, 1), date(2024, 1, 2)).unwrap();
        let (start, end) = period.utc_bounds(FixedOffset::east_opt(0).unwrap());
        assert_eq!(start.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2024-01-02T23:59:59.999+00:00");
    }

    #[test]
    fn utc_bounds_shift_with_offset() {
        let period = StatsPeriod::new(date(2024, 1, 1), date(2024, 1, 1)).unwrap();
        let (start, _) = period.utc_bounds(FixedOffset::east_opt(9 * 3600).unwrap());
        assert_eq!(start.to_rfc3339(), "2023-12-31T15:00:00+00:00");
    }
}

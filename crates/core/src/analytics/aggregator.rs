//! Visitor statistics over an already bounded window of visit records.
//!
//! One pass fills five keyed tallies (page, day, session, browser, OS) whose
//! buckets are kept in first-occurrence order; the stable sorts applied when
//! materializing the report then break ties by that order.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

use crate::analytics::user_agent::classify;
use crate::domain::{
    Browser, BrowserStat, DailyStat, OsFamily, OsStat, PageStat, SessionStat, StatsReport,
    VisitRecord,
};
use crate::types::StatsPeriod;

#[derive(Debug, Clone, Copy)]
pub struct VisitorStatsAggregator {
    period: StatsPeriod,
    offset: FixedOffset,
}

impl VisitorStatsAggregator {
    /// Aggregator for `period` with calendar days counted in UTC.
    pub fn new(period: StatsPeriod) -> Self {
        Self {
            period,
            offset: utc_offset(),
        }
    }

    /// Offset used to truncate `visited_at` to a calendar day.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn aggregate(&self, records: &[VisitRecord]) -> StatsReport {
        let mut unique_ips: HashSet<&str> = HashSet::new();
        let mut pages: Tally<&str> = Tally::default();
        let mut days: Tally<NaiveDate> = Tally::default();
        let mut browsers: Tally<Browser> = Tally::default();
        let mut systems: Tally<OsFamily> = Tally::default();
        let mut sessions = SessionTally::default();

        for record in records {
            let ip = record.ip_address.as_str();
            if !ip.is_empty() {
                unique_ips.insert(ip);
            }
            let day = record.visited_at.with_timezone(&self.offset).date_naive();

            pages.hit(record.page_key(), ip);
            days.hit(day, ip);
            sessions.hit(record);
            if let Some(user_agent) = record.classifiable_user_agent() {
                let labels = classify(user_agent);
                browsers.hit(labels.browser, ip);
                systems.hit(labels.os, ip);
            }
        }

        let total_visitors = records.len() as u64;

        let mut page_stats: Vec<PageStat> = pages
            .into_buckets()
            .map(|bucket| PageStat {
                page: bucket.key.to_string(),
                visits: bucket.visits,
                unique_visitors: bucket.unique_visitors(),
            })
            .collect();
        page_stats.sort_by(|a, b| b.visits.cmp(&a.visits));

        let mut daily_stats: Vec<DailyStat> = days
            .into_buckets()
            .map(|bucket| DailyStat {
                date: bucket.key,
                visits: bucket.visits,
                unique_visitors: bucket.unique_visitors(),
            })
            .collect();
        daily_stats.sort_by(|a, b| b.date.cmp(&a.date));

        let mut session_stats = sessions.into_stats();
        session_stats.sort_by(|a, b| b.last_visit.cmp(&a.last_visit));

        let mut browser_stats: Vec<BrowserStat> = browsers
            .into_buckets()
            .map(|bucket| BrowserStat {
                browser: bucket.key,
                visits: bucket.visits,
                unique_visitors: bucket.unique_visitors(),
                percentage: percentage(bucket.visits, total_visitors),
            })
            .collect();
        browser_stats.sort_by(|a, b| b.visits.cmp(&a.visits));

        let mut os_stats: Vec<OsStat> = systems
            .into_buckets()
            .map(|bucket| OsStat {
                os: bucket.key,
                visits: bucket.visits,
                unique_visitors: bucket.unique_visitors(),
                percentage: percentage(bucket.visits, total_visitors),
            })
            .collect();
        os_stats.sort_by(|a, b| b.visits.cmp(&a.visits));

        let total_sessions = session_stats.len() as u64;
        let avg_page_views = if total_sessions > 0 {
            round_one_decimal(total_visitors as f64 / total_sessions as f64)
        } else {
            0.0
        };
        let avg_session_duration = if total_sessions > 0 {
            let total_ms: i64 = session_stats.iter().map(|session| session.duration).sum();
            (total_ms as f64 / total_sessions as f64 / 1000.0).round() as u64
        } else {
            0
        };

        StatsReport {
            period: self.period.echo(),
            total_visitors,
            unique_visitors: unique_ips.len() as u64,
            total_sessions,
            avg_page_views,
            avg_session_duration,
            page_stats,
            daily_stats,
            session_stats,
            browser_stats,
            os_stats,
        }
    }
}

/// Aggregates `records` for `period`, counting calendar days in UTC.
pub fn aggregate(period: StatsPeriod, records: &[VisitRecord]) -> StatsReport {
    VisitorStatsAggregator::new(period).aggregate(records)
}

struct Bucket<'a, K> {
    key: K,
    visits: u64,
    ips: HashSet<&'a str>,
}

impl<K> Bucket<'_, K> {
    fn unique_visitors(&self) -> u64 {
        self.ips.len() as u64
    }
}

struct Tally<'a, K> {
    index: HashMap<K, usize>,
    buckets: Vec<Bucket<'a, K>>,
}

impl<K> Default for Tally<'_, K> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            buckets: Vec::new(),
        }
    }
}

impl<'a, K: Copy + Eq + Hash> Tally<'a, K> {
    fn hit(&mut self, key: K, ip: &'a str) {
        let position = match self.index.get(&key) {
            Some(position) => *position,
            None => {
                self.buckets.push(Bucket {
                    key,
                    visits: 0,
                    ips: HashSet::new(),
                });
                self.index.insert(key, self.buckets.len() - 1);
                self.buckets.len() - 1
            }
        };
        let bucket = &mut self.buckets[position];
        bucket.visits += 1;
        if !ip.is_empty() {
            bucket.ips.insert(ip);
        }
    }

    fn into_buckets(self) -> impl Iterator<Item = Bucket<'a, K>> {
        self.buckets.into_iter()
    }
}

struct SessionBucket<'a> {
    session_id: &'a str,
    ip_address: &'a str,
    user_agent: Option<&'a str>,
    first_visit: DateTime<Utc>,
    last_visit: DateTime<Utc>,
    pages: Vec<&'a str>,
}

#[derive(Default)]
struct SessionTally<'a> {
    index: HashMap<&'a str, usize>,
    buckets: Vec<SessionBucket<'a>>,
}

impl<'a> SessionTally<'a> {
    fn hit(&mut self, record: &'a VisitRecord) {
        let session_id = record.session_key();
        let page = record.page_key();
        match self.index.get(session_id) {
            Some(position) => {
                let bucket = &mut self.buckets[*position];
                bucket.first_visit = bucket.first_visit.min(record.visited_at);
                bucket.last_visit = bucket.last_visit.max(record.visited_at);
                bucket.pages.push(page);
            }
            None => {
                self.index.insert(session_id, self.buckets.len());
                self.buckets.push(SessionBucket {
                    session_id,
                    ip_address: &record.ip_address,
                    user_agent: record.user_agent.as_deref(),
                    first_visit: record.visited_at,
                    last_visit: record.visited_at,
                    pages: vec![page],
                });
            }
        }
    }

    fn into_stats(self) -> Vec<SessionStat> {
        self.buckets
            .into_iter()
            .map(|bucket| {
                let unique_pages = bucket.pages.iter().collect::<HashSet<_>>().len() as u64;
                let duration = (bucket.last_visit - bucket.first_visit)
                    .num_milliseconds()
                    .max(0);
                SessionStat {
                    session_id: bucket.session_id.to_string(),
                    ip_address: bucket.ip_address.to_string(),
                    page_views: bucket.pages.len() as u64,
                    unique_pages,
                    duration,
                    first_visit: bucket.first_visit,
                    last_visit: bucket.last_visit,
                    user_agent: bucket.user_agent.map(str::to_string),
                    pages: bucket.pages.into_iter().map(str::to_string).collect(),
                }
            })
            .collect()
    }
}

fn percentage(visits: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    (visits as f64 / total as f64 * 100.0).round() as u32
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

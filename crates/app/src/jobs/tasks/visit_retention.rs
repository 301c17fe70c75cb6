use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::jobs::JobError;
use crate::state::AppState;
use folio_infra::db::prune_visits_before;

/// Deletes visits older than the configured retention. Returns the number of
/// rows removed.
pub async fn run(state: &AppState) -> Result<u64, JobError> {
    let Some(pool) = state.db.as_ref() else {
        warn!("visit retention skipped: db not configured");
        return Ok(0);
    };
    let Some(cutoff) = retention_cutoff(Utc::now(), state.config.retention_days) else {
        return Ok(0);
    };
    debug!(%cutoff, "pruning visits");
    let deleted = prune_visits_before(pool, cutoff).await?;
    Ok(deleted)
}

fn retention_cutoff(now: DateTime<Utc>, retention_days: u32) -> Option<DateTime<Utc>> {
    if retention_days == 0 {
        return None;
    }
    now.checked_sub_signed(Duration::days(i64::from(retention_days)))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::retention_cutoff;

    #[test]
    fn zero_days_disables_pruning() {
        assert!(retention_cutoff(Utc::now(), 0).is_none());
    }

    #[test]
    fn cutoff_is_days_before_now() {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
        let cutoff = retention_cutoff(now, 30).unwrap();
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2024, 5, 31, 12, 0, 0).unwrap());
    }
}

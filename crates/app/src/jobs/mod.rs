pub mod scheduler;
pub mod tasks;

use thiserror::Error;
use tracing::{info, warn};

use crate::state::AppState;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("visit log error: {0}")]
    Visits(#[from] folio_infra::db::VisitsRepoError),
}

/// Runs the background jobs until one of them stops. Returns immediately when
/// nothing is scheduled.
pub async fn start(state: AppState) -> Result<(), JobError> {
    if state.db.is_none() {
        warn!("db not configured; skipping visit retention");
        return Ok(());
    }
    let retention_days = state.config.retention_days;
    let interval = state.config.retention_interval;
    if retention_days == 0 || interval.is_zero() {
        info!("visit retention disabled; keeping visits forever");
        return Ok(());
    }

    info!(retention_days, every_secs = interval.as_secs(), "visit retention scheduled");
    let retention_state = state.clone();
    scheduler::run_interval("visit_retention", interval, move || {
        let state = retention_state.clone();
        async move {
            match tasks::visit_retention::run(&state).await {
                Ok(deleted) => info!(deleted, "visit retention run complete"),
                Err(err) => warn!(error = %err, "visit retention run failed"),
            }
            Ok(())
        }
    })
    .await
}

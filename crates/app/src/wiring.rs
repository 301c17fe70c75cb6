use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::config::AppConfig;
use crate::state::AppState;
use folio_infra::db::{connect_lazy, DbPoolError};

#[derive(Debug, Error)]
pub enum WiringError {
    #[error("db pool error: {0}")]
    Db(#[from] DbPoolError),
}

pub fn build_state(config: AppConfig) -> Result<AppState, WiringError> {
    let db = config
        .database_url
        .as_deref()
        .map(|url| connect_lazy(url, config.db_max_connections))
        .transpose()?;
    if db.is_none() {
        warn!("FOLIO_DATABASE_URL not set; visit log and stats are disabled");
    }
    Ok(AppState {
        config: Arc::new(config),
        db,
    })
}

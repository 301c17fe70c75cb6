use std::sync::Arc;

use crate::config::AppConfig;
use folio_infra::db::DbPool;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Option<DbPool>,
}

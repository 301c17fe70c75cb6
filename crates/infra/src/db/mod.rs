pub mod migrations;
pub mod pool;
pub mod visits_repo;

pub use migrations::run_migrations;
pub use pool::{connect_lazy, DbPool, DbPoolError, DEFAULT_MAX_CONNECTIONS};
pub use visits_repo::{
    fetch_visits, list_recent_visits, prune_visits_before, record_visit, NewVisit, VisitLogEntry,
    VisitsRepoError,
};

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub modules: HealthModules,
}

#[derive(Debug, Serialize)]
pub struct HealthModules {
    pub database: DatabaseStatus,
    pub visits: ModuleStatus,
    pub retention: RetentionStatus,
}

#[derive(Debug, Serialize)]
pub struct ModuleStatus {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct DatabaseStatus {
    pub configured: bool,
}

#[derive(Debug, Serialize)]
pub struct RetentionStatus {
    pub enabled: bool,
    pub days: u32,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_configured = state.db.is_some();
    let retention_days = state.config.retention_days;

    Json(HealthResponse {
        status: "ok",
        modules: HealthModules {
            database: DatabaseStatus {
                configured: db_configured,
            },
            visits: ModuleStatus {
                enabled: db_configured,
            },
            retention: RetentionStatus {
                enabled: db_configured && retention_days > 0,
                days: retention_days,
            },
        },
    })
}

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;
use upkeep_scheduler::recurrence::same_day;

use crate::app::AppState;
use crate::error::ApiError;

const DEFAULT_RUNS: usize = 20;
const MAX_RUNS: usize = 100;

/// GET /health: liveness check plus the outcome of the last job pass.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let last_run = state.runs.last_run().unwrap_or_else(|e| {
        warn!("could not read run history: {e}");
        None
    });
    let ran_today = last_run
        .as_ref()
        .is_some_and(|run| same_day(&run.finished_at, &Utc::now()));
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "scheduler_enabled": state.config.scheduler.enabled,
        "ran_today": ran_today,
        "last_run": last_run,
    }))
}

#[derive(Deserialize)]
pub struct RunsQuery {
    pub limit: Option<usize>,
}

/// GET /health/runs?limit=N: recent job passes, newest first.
pub async fn runs_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<Value>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_RUNS).clamp(1, MAX_RUNS);
    let runs = state.runs.recent(limit).map_err(ApiError::internal)?;
    Ok(Json(json!({ "runs": runs })))
}

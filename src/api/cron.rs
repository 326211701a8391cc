//! Scheduled Rule Routes
//!
//! Manual triggering and run inspection for scheduled rules. The
//! auto-approval scan normally fires on its own interval; the trigger
//! endpoint runs the same scan on demand so operators do not have to
//! wait out the hour after changing something.
//!
//! Routes:
//! - POST /cron/auto-approve - Run the auto-approval scan now
//! - GET /cron/runs/:name - Last recorded run for a rule

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::parse_datetime;
use crate::services::auto_approval::RunOutcome;
use crate::{AppState, Error, Result};

/// Build scheduled rule routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auto-approve", post(trigger_auto_approve))
        .route("/runs/:name", get(get_rule_run))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Recorded run state for a scheduled rule.
#[derive(Debug, Serialize, Deserialize)]
pub struct CronRunResponse {
    pub name: String,
    pub status: String,
    pub last_run_at: DateTime<Utc>,
    pub next_run_at: Option<DateTime<Utc>>,
    pub run_count: i64,
    pub processed: i64,
    /// Per-item errors from the most recent run
    pub last_error: Option<serde_json::Value>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Run the auto-approval scan immediately.
///
/// POST /cron/auto-approve
///
/// Runs the same idempotent scan the scheduler fires hourly and
/// returns its outcome. Safe to call while the scheduler is active;
/// the conditional transition keeps double approval out.
#[axum::debug_handler]
async fn trigger_auto_approve(State(state): State<AppState>) -> Result<Json<RunOutcome>> {
    let outcome = state.approvals.run().await?;
    Ok(Json(outcome))
}

/// Get the last recorded run for a rule.
///
/// GET /cron/runs/:name
#[axum::debug_handler]
async fn get_rule_run(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CronRunResponse>> {
    let run = crate::db::get_run(&state.db, &name)
        .await?
        .ok_or_else(|| Error::NotFound(format!("No runs recorded for rule: {}", name)))?;

    Ok(Json(CronRunResponse {
        last_run_at: parse_datetime(&run.last_run_at),
        next_run_at: run.next_run_at.as_deref().map(parse_datetime),
        last_error: run
            .last_error
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok()),
        name: run.name,
        status: run.status,
        run_count: run.run_count,
        processed: run.processed,
    }))
}

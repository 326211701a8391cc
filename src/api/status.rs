//! Status Routes
//!
//! Health checks and status endpoints.
//!
//! Routes:
//! - GET /health - Basic health check
//! - GET /health/ready - Readiness check (all dependencies up)
//! - GET /health/live - Liveness check (server responding)
//! - GET /status - Detailed system status

use std::sync::OnceLock;
use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::parse_datetime;
use crate::services::auto_approval::RULE_NAME;
use crate::{AppState, Result};

static STARTUP_TIME: OnceLock<Instant> = OnceLock::new();

/// Initialize startup time. Call this once at server start.
pub fn init_startup_time() {
    let _ = STARTUP_TIME.get_or_init(Instant::now);
}

/// Get uptime in seconds since server start.
fn get_uptime_seconds() -> u64 {
    STARTUP_TIME.get().map(|start| start.elapsed().as_secs()).unwrap_or(0)
}

/// Build status routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
        .route("/health/live", get(liveness_check))
        .route("/status", get(system_status))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: Vec<DependencyCheck>,
}

#[derive(Debug, Serialize)]
pub struct DependencyCheck {
    pub name: String,
    pub status: HealthStatus,
    pub latency_ms: Option<u64>,
    pub message: Option<String>,
}

/// System status response.
#[derive(Debug, Serialize)]
pub struct SystemStatusResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub database: DatabaseStatus,
    /// Bookkeeping for the auto-approval rule, when it has run
    pub approvals: Option<ApprovalRunSummary>,
}

#[derive(Debug, Serialize)]
pub struct DatabaseStatus {
    pub connected: bool,
    pub pool_size: u32,
    pub active_connections: u32,
}

#[derive(Debug, Serialize)]
pub struct ApprovalRunSummary {
    pub status: String,
    pub last_run_at: DateTime<Utc>,
    pub next_run_at: Option<DateTime<Utc>>,
    pub run_count: i64,
    pub processed: i64,
}

// ============================================================================
// Handlers
// ============================================================================

/// Basic health check.
///
/// GET /health
///
/// Returns 200 if the server is running. Used by load balancers
/// for basic availability checking.
#[axum::debug_handler]
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").into(),
        timestamp: Utc::now(),
    })
}

/// Readiness check.
///
/// GET /health/ready
///
/// Checks if all dependencies are available and the service
/// is ready to handle requests. Returns 503 if not ready.
#[axum::debug_handler]
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_check = check_database(&state).await;
    let ready = db_check.status == HealthStatus::Healthy;

    let response = ReadinessResponse {
        ready,
        checks: vec![db_check],
    };

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

/// Liveness check.
///
/// GET /health/live
///
/// Simple check that the server is responding.
#[axum::debug_handler]
async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

/// Detailed system status.
///
/// GET /status
///
/// Returns database stats, uptime, and the most recent
/// auto-approval run.
#[axum::debug_handler]
async fn system_status(State(state): State<AppState>) -> Result<Json<SystemStatusResponse>> {
    let uptime_seconds = get_uptime_seconds();

    let database = get_database_status(&state).await;

    let approvals = crate::db::get_run(&state.db, RULE_NAME)
        .await
        .unwrap_or(None)
        .map(|run| ApprovalRunSummary {
            status: run.status,
            last_run_at: parse_datetime(&run.last_run_at),
            next_run_at: run.next_run_at.as_deref().map(parse_datetime),
            run_count: run.run_count,
            processed: run.processed,
        });

    let status = if database.connected {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    };

    Ok(Json(SystemStatusResponse {
        status,
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_seconds,
        database,
        approvals,
    }))
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Check database connectivity.
async fn check_database(state: &AppState) -> DependencyCheck {
    let start = Instant::now();

    let result = sqlx::query_as::<_, (i64,)>("SELECT 1")
        .fetch_one(&state.db)
        .await;

    let latency_ms = start.elapsed().as_millis() as u64;
    let (connected, message) = match result {
        Ok(_) => (true, None),
        Err(e) => (false, Some(format!("Database error: {}", e))),
    };

    DependencyCheck {
        name: "database".into(),
        status: if connected {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        },
        latency_ms: Some(latency_ms),
        message,
    }
}

/// Get database status.
async fn get_database_status(state: &AppState) -> DatabaseStatus {
    let pool_size = state.db.options().get_max_connections();

    let connected = sqlx::query_as::<_, (i64,)>("SELECT 1")
        .fetch_one(&state.db)
        .await
        .is_ok();

    DatabaseStatus {
        connected,
        pool_size,
        active_connections: state.db.size(),
    }
}

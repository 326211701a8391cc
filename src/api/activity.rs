//! Activity Log Routes
//!
//! Read access to the append-only audit trail of domain events.
//!
//! Routes:
//! - GET /activity - List activity entries

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{parse_datetime, Activity};
use crate::{AppState, Result};

/// Build activity routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_activity))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing activity entries.
#[derive(Debug, Deserialize, Default)]
pub struct ListActivityQuery {
    pub project_id: Option<String>,
    pub subject_id: Option<String>,
    /// Dotted event name, e.g. `access_request.auto_approved`
    pub event_type: Option<String>,
    #[serde(default)]
    pub offset: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    20
}

/// Activity entry response.
#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub id: String,
    pub event_type: String,
    pub actor: String,
    pub project_id: Option<String>,
    pub subject_id: Option<String>,
    pub message: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<Activity> for ActivityResponse {
    fn from(a: Activity) -> Self {
        Self {
            metadata: a.metadata_json(),
            created_at: parse_datetime(&a.created_at),
            id: a.id,
            event_type: a.event_type,
            actor: a.actor,
            project_id: a.project_id,
            subject_id: a.subject_id,
            message: a.message,
        }
    }
}

/// List of activity entries response.
#[derive(Debug, Serialize)]
pub struct ListActivityResponse {
    pub activities: Vec<ActivityResponse>,
    pub offset: u32,
    pub limit: u32,
}

// ============================================================================
// Handlers
// ============================================================================

/// List activity entries, newest first.
///
/// GET /activity
///
/// Optionally filtered by project, subject entity, and event type.
#[axum::debug_handler]
async fn list_activity(
    State(state): State<AppState>,
    Query(query): Query<ListActivityQuery>,
) -> Result<Json<ListActivityResponse>> {
    let limit = query.limit.min(100);

    let filter = crate::db::ActivityFilter {
        project_id: query.project_id,
        subject_id: query.subject_id,
        event_type: query.event_type,
    };

    let activities =
        crate::db::list_activities(&state.db, &filter, limit as i64, query.offset as i64).await?;

    Ok(Json(ListActivityResponse {
        activities: activities.into_iter().map(Into::into).collect(),
        offset: query.offset,
        limit,
    }))
}

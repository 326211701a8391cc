//! Access Request Routes
//!
//! Client-initiated code access requests and their review lifecycle.
//! Requests start out pending with an auto-approval deadline; admins
//! can approve or reject them earlier, and the scheduled rule approves
//! whatever is still pending once the deadline passes.
//!
//! Routes:
//! - GET /access-requests - List requests
//! - POST /access-requests - Submit a new request
//! - GET /access-requests/:id - Get request details
//! - POST /access-requests/:id/approve - Approve a pending request
//! - POST /access-requests/:id/reject - Reject a pending request

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::{
    new_id, parse_datetime, AccessRequest, NotificationPriority, Project, Recipient,
    RequestStatus,
};
use crate::{AppState, Error, Result};

/// Build access request routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_access_requests).post(create_access_request))
        .route("/:id", get(get_access_request))
        .route("/:id/approve", post(approve_access_request))
        .route("/:id/reject", post(reject_access_request))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to submit a new access request.
#[derive(Debug, Deserialize)]
pub struct CreateAccessRequestBody {
    pub user_id: String,
    /// Project ID or slug
    pub project_id: String,
    pub reason: Option<String>,
}

/// Optional review details for approve/reject actions.
#[derive(Debug, Deserialize, Default)]
pub struct ReviewRequestBody {
    /// Defaults to "admin" when omitted
    pub reviewed_by: Option<String>,
    pub notes: Option<String>,
}

/// Query parameters for listing access requests.
#[derive(Debug, Deserialize, Default)]
pub struct ListAccessRequestsQuery {
    pub user_id: Option<String>,
    pub project_id: Option<String>,
    /// "pending", "approved", or "rejected"
    pub status: Option<String>,
    #[serde(default)]
    pub offset: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    20
}

/// Access request response.
#[derive(Debug, Serialize)]
pub struct AccessRequestResponse {
    pub id: String,
    pub request_number: String,
    pub user_id: String,
    pub project_id: String,
    pub reason: Option<String>,
    pub status: String,
    pub auto_approve_at: DateTime<Utc>,
    pub access_granted: bool,
    pub access_granted_at: Option<DateTime<Utc>>,
    pub repo_url: Option<String>,
    pub download_url: Option<String>,
    pub download_expires_at: Option<DateTime<Utc>>,
    pub review_notes: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AccessRequest> for AccessRequestResponse {
    fn from(r: AccessRequest) -> Self {
        Self {
            access_granted: r.is_access_granted(),
            auto_approve_at: parse_datetime(&r.auto_approve_at),
            access_granted_at: r.access_granted_at.as_deref().map(parse_datetime),
            download_expires_at: r.download_expires_at.as_deref().map(parse_datetime),
            reviewed_at: r.reviewed_at.as_deref().map(parse_datetime),
            created_at: parse_datetime(&r.created_at),
            updated_at: parse_datetime(&r.updated_at),
            id: r.id,
            request_number: r.request_number,
            user_id: r.user_id,
            project_id: r.project_id,
            reason: r.reason,
            status: r.status,
            repo_url: r.repo_url,
            download_url: r.download_url,
            review_notes: r.review_notes,
            reviewed_by: r.reviewed_by,
        }
    }
}

/// List of access requests response.
#[derive(Debug, Serialize)]
pub struct ListAccessRequestsResponse {
    pub requests: Vec<AccessRequestResponse>,
    pub total: u32,
    pub offset: u32,
    pub limit: u32,
}

// ============================================================================
// Handlers
// ============================================================================

/// List access requests.
///
/// GET /access-requests
///
/// Returns a paginated list, newest first, optionally filtered by
/// user, project, and status.
#[axum::debug_handler]
async fn list_access_requests(
    State(state): State<AppState>,
    Query(query): Query<ListAccessRequestsQuery>,
) -> Result<Json<ListAccessRequestsResponse>> {
    let limit = query.limit.min(100);

    let status = match &query.status {
        Some(s) => Some(
            RequestStatus::from_str(s)
                .ok_or_else(|| Error::Validation(format!("Unknown request status: {}", s)))?,
        ),
        None => None,
    };

    let filter = crate::db::AccessRequestFilter {
        user_id: query.user_id,
        project_id: query.project_id,
        status,
    };

    let requests =
        crate::db::list_access_requests(&state.db, &filter, limit as i64, query.offset as i64)
            .await?;
    let total = crate::db::count_access_requests(&state.db, &filter).await? as u32;

    Ok(Json(ListAccessRequestsResponse {
        requests: requests.into_iter().map(Into::into).collect(),
        total,
        offset: query.offset,
        limit,
    }))
}

/// Submit a new access request.
///
/// POST /access-requests
///
/// The request starts out pending with an auto-approval deadline 24
/// hours out (configurable). At most one open request per user and
/// project is allowed; a second one is rejected with 409.
#[axum::debug_handler]
async fn create_access_request(
    State(state): State<AppState>,
    Json(request): Json<CreateAccessRequestBody>,
) -> Result<(StatusCode, Json<AccessRequestResponse>)> {
    if request.user_id.trim().is_empty() {
        return Err(Error::Validation("user_id must not be empty".into()));
    }

    let project = crate::db::get_project_by_id_or_slug(&state.db, &request.project_id).await?;

    let now = Utc::now();
    let auto_approve_at =
        now + chrono::Duration::hours(crate::config().approvals.auto_approve_delay_hours);

    let created = crate::db::create_access_request(
        &state.db,
        crate::db::CreateAccessRequest {
            id: new_id(),
            user_id: request.user_id,
            project_id: project.id.clone(),
            reason: request.reason,
        },
        now,
        auto_approve_at,
    )
    .await?;

    info!(
        request = %created.request_number,
        user_id = %created.user_id,
        project = %project.slug,
        "Access request submitted"
    );

    notify_admins_of_submission(&state, &created, &project).await;

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Get an access request by ID.
///
/// GET /access-requests/:id
#[axum::debug_handler]
async fn get_access_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AccessRequestResponse>> {
    let request = crate::db::get_access_request(&state.db, &id).await?;
    Ok(Json(request.into()))
}

/// Approve a pending request.
///
/// POST /access-requests/:id/approve
///
/// Explicit admin action. Uses the same conditional transition as the
/// scheduled rule, so a request can be approved at most once; a request
/// that is no longer pending is rejected with 409.
#[axum::debug_handler]
async fn approve_access_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<ReviewRequestBody>>,
) -> Result<Json<AccessRequestResponse>> {
    let Json(body) = body.unwrap_or_default();
    let reviewed_by = body.reviewed_by.unwrap_or_else(|| "admin".to_string());

    let request = crate::db::get_access_request(&state.db, &id).await?;
    let project = crate::db::get_project(&state.db, &request.project_id).await?;

    let now = Utc::now();
    let fields = crate::db::ApproveRequest {
        reviewed_by: reviewed_by.clone(),
        review_notes: body.notes,
        repo_url: project.repo_url.clone(),
        download_url: project.download_url.clone(),
        download_expires_at: Some(
            now + chrono::Duration::days(state.approvals.settings().download_expiry_days),
        ),
        approved_at: now,
    };

    let transitioned =
        crate::db::approve_request_if_pending(&state.db, &request.id, &fields).await?;
    if !transitioned {
        return Err(Error::Conflict(format!(
            "Request {} is not pending",
            request.request_number
        )));
    }

    info!(
        request = %request.request_number,
        reviewed_by = %reviewed_by,
        "Access request approved"
    );

    notify_requester_of_review(&state, &request, &project, "approved", &reviewed_by).await;

    let updated = crate::db::get_access_request(&state.db, &request.id).await?;
    Ok(Json(updated.into()))
}

/// Reject a pending request.
///
/// POST /access-requests/:id/reject
///
/// Explicit admin action; terminal. A request that is no longer
/// pending is rejected with 409.
#[axum::debug_handler]
async fn reject_access_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<ReviewRequestBody>>,
) -> Result<Json<AccessRequestResponse>> {
    let Json(body) = body.unwrap_or_default();
    let reviewed_by = body.reviewed_by.unwrap_or_else(|| "admin".to_string());

    let request = crate::db::get_access_request(&state.db, &id).await?;
    let project = crate::db::get_project(&state.db, &request.project_id).await?;

    let transitioned = crate::db::reject_request_if_pending(
        &state.db,
        &request.id,
        &reviewed_by,
        body.notes.as_deref(),
        Utc::now(),
    )
    .await?;
    if !transitioned {
        return Err(Error::Conflict(format!(
            "Request {} is not pending",
            request.request_number
        )));
    }

    info!(
        request = %request.request_number,
        reviewed_by = %reviewed_by,
        "Access request rejected"
    );

    notify_requester_of_review(&state, &request, &project, "rejected", &reviewed_by).await;

    let updated = crate::db::get_access_request(&state.db, &request.id).await?;
    Ok(Json(updated.into()))
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Best-effort admin notification and activity entry for a new request.
async fn notify_admins_of_submission(
    state: &AppState,
    request: &AccessRequest,
    project: &Project,
) {
    let notification = crate::db::CreateNotification {
        id: new_id(),
        recipient: Recipient::Admins,
        title: format!("New access request: {}", request.request_number),
        message: format!(
            "User {} requested access to {}.",
            request.user_id, project.name
        ),
        link: None,
        priority: NotificationPriority::Normal,
    };
    if let Err(e) = crate::db::create_notification(&state.db, notification).await {
        warn!(request = %request.request_number, error = %e, "Admin notification failed");
    }

    let activity = crate::db::CreateActivity {
        id: new_id(),
        event_type: "access_request.submitted".to_string(),
        actor: request.user_id.clone(),
        project_id: Some(request.project_id.clone()),
        subject_id: Some(request.id.clone()),
        message: format!("Access request {} submitted", request.request_number),
        metadata: None,
    };
    if let Err(e) = crate::db::append_activity(&state.db, activity).await {
        warn!(request = %request.request_number, error = %e, "Activity append failed");
    }
}

/// Best-effort notification and activity entry for an admin review.
async fn notify_requester_of_review(
    state: &AppState,
    request: &AccessRequest,
    project: &Project,
    decision: &str,
    reviewed_by: &str,
) {
    let notification = crate::db::CreateNotification {
        id: new_id(),
        recipient: Recipient::User(request.user_id.clone()),
        title: format!("Access request {} {}", request.request_number, decision),
        message: format!(
            "Your access request for {} has been {}.",
            project.name, decision
        ),
        link: None,
        priority: NotificationPriority::Normal,
    };
    if let Err(e) = crate::db::create_notification(&state.db, notification).await {
        warn!(request = %request.request_number, error = %e, "Requester notification failed");
    }

    let activity = crate::db::CreateActivity {
        id: new_id(),
        event_type: format!("access_request.{}", decision),
        actor: reviewed_by.to_string(),
        project_id: Some(request.project_id.clone()),
        subject_id: Some(request.id.clone()),
        message: format!("Access request {} {}", request.request_number, decision),
        metadata: None,
    };
    if let Err(e) = crate::db::append_activity(&state.db, activity).await {
        warn!(request = %request.request_number, error = %e, "Activity append failed");
    }
}

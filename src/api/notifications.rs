//! Notification Routes
//!
//! In-app notification feed for users and the admin team.
//!
//! Routes:
//! - GET /notifications - List notifications for a recipient
//! - POST /notifications/:id/read - Mark a notification as read

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{parse_datetime, Notification};
use crate::{AppState, Error, Result};

/// Build notification routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/:id/read", post(mark_read))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing notifications.
#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    /// "user" or "admins"
    pub recipient_type: String,
    /// Required when recipient_type is "user"
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub unread_only: bool,
    #[serde(default)]
    pub offset: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    20
}

/// Notification response.
#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: String,
    pub recipient_type: String,
    pub recipient_id: Option<String>,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub priority: String,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            read: n.is_read(),
            read_at: n.read_at.as_deref().map(parse_datetime),
            created_at: parse_datetime(&n.created_at),
            id: n.id,
            recipient_type: n.recipient_type,
            recipient_id: n.recipient_id,
            title: n.title,
            message: n.message,
            link: n.link,
            priority: n.priority,
        }
    }
}

/// List of notifications response.
#[derive(Debug, Serialize)]
pub struct ListNotificationsResponse {
    pub notifications: Vec<NotificationResponse>,
    /// Unread count for the recipient, independent of pagination
    pub unread: u32,
    pub offset: u32,
    pub limit: u32,
}

// ============================================================================
// Handlers
// ============================================================================

/// List notifications for a recipient, newest first.
///
/// GET /notifications?recipient_type=user&recipient_id=user-1
///
/// Admin broadcasts are shared across the team, so recipient_id is
/// only meaningful for user recipients.
#[axum::debug_handler]
async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<Json<ListNotificationsResponse>> {
    let limit = query.limit.min(100);

    let recipient_id = match query.recipient_type.as_str() {
        "user" => match &query.recipient_id {
            Some(id) => Some(id.as_str()),
            None => {
                return Err(Error::Validation(
                    "recipient_id is required when recipient_type is 'user'".into(),
                ))
            }
        },
        "admins" => None,
        other => {
            return Err(Error::Validation(format!(
                "recipient_type must be 'user' or 'admins', got: {}",
                other
            )))
        }
    };

    let notifications = crate::db::list_notifications(
        &state.db,
        &query.recipient_type,
        recipient_id,
        query.unread_only,
        limit as i64,
        query.offset as i64,
    )
    .await?;
    let unread = crate::db::count_unread(&state.db, &query.recipient_type, recipient_id).await?;

    Ok(Json(ListNotificationsResponse {
        notifications: notifications.into_iter().map(Into::into).collect(),
        unread: unread as u32,
        offset: query.offset,
        limit,
    }))
}

/// Mark a notification as read.
///
/// POST /notifications/:id/read
///
/// Idempotent; the original read time is kept on repeat calls.
#[axum::debug_handler]
async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NotificationResponse>> {
    let notification = crate::db::mark_notification_read(&state.db, &id, Utc::now()).await?;
    Ok(Json(notification.into()))
}

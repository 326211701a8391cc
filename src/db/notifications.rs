//! Notification database queries.

use crate::models::{to_db_timestamp, Notification, NotificationPriority, Recipient};
use crate::{Error, Result};
use chrono::{DateTime, Utc};

use super::DbPool;

/// Input for creating a notification.
#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub id: String,
    pub recipient: Recipient,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub priority: NotificationPriority,
}

/// Create a notification.
pub async fn create_notification(
    pool: &DbPool,
    input: CreateNotification,
) -> Result<Notification> {
    sqlx::query_as::<_, Notification>(
        r#"
        INSERT INTO notifications (id, recipient_type, recipient_id, title, message, link, priority)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(input.recipient.recipient_type())
    .bind(input.recipient.recipient_id())
    .bind(&input.title)
    .bind(&input.message)
    .bind(&input.link)
    .bind(input.priority.as_str())
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// List notifications for a recipient, newest first.
///
/// For user recipients the recipient_id must match; admin broadcasts
/// are shared, so recipient_id is ignored for them.
pub async fn list_notifications(
    pool: &DbPool,
    recipient_type: &str,
    recipient_id: Option<&str>,
    unread_only: bool,
    limit: i64,
    offset: i64,
) -> Result<Vec<Notification>> {
    let mut conditions = vec!["recipient_type = ?"];
    if recipient_id.is_some() {
        conditions.push("recipient_id = ?");
    }
    if unread_only {
        conditions.push("read_at IS NULL");
    }

    let query = format!(
        "SELECT * FROM notifications WHERE {} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        conditions.join(" AND ")
    );

    let mut q = sqlx::query_as::<_, Notification>(&query).bind(recipient_type);
    if let Some(recipient_id) = recipient_id {
        q = q.bind(recipient_id);
    }
    q = q.bind(limit).bind(offset);

    q.fetch_all(pool).await.map_err(Error::Database)
}

/// Count unread notifications for a recipient.
pub async fn count_unread(
    pool: &DbPool,
    recipient_type: &str,
    recipient_id: Option<&str>,
) -> Result<i64> {
    let query = if recipient_id.is_some() {
        "SELECT COUNT(*) FROM notifications WHERE recipient_type = ? AND recipient_id = ? AND read_at IS NULL"
    } else {
        "SELECT COUNT(*) FROM notifications WHERE recipient_type = ? AND read_at IS NULL"
    };

    let mut q = sqlx::query_as::<_, (i64,)>(query).bind(recipient_type);
    if let Some(recipient_id) = recipient_id {
        q = q.bind(recipient_id);
    }

    let (count,) = q.fetch_one(pool).await?;
    Ok(count)
}

/// Mark a notification as read. Keeps the original read time if
/// it was already read.
pub async fn mark_notification_read(
    pool: &DbPool,
    id: &str,
    read_at: DateTime<Utc>,
) -> Result<Notification> {
    sqlx::query_as::<_, Notification>(
        r#"
        UPDATE notifications
        SET read_at = COALESCE(read_at, ?)
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(to_db_timestamp(read_at))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Notification not found: {}", id)))
}

//! Activity log database queries.

use crate::models::Activity;
use crate::{Error, Result};

use super::DbPool;

/// Input for appending an activity entry.
#[derive(Debug, Clone)]
pub struct CreateActivity {
    pub id: String,
    pub event_type: String,
    pub actor: String,
    pub project_id: Option<String>,
    pub subject_id: Option<String>,
    pub message: String,
    /// JSON object with event-specific details
    pub metadata: Option<String>,
}

/// Filter for listing activity entries.
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub project_id: Option<String>,
    pub subject_id: Option<String>,
    pub event_type: Option<String>,
}

/// Append an entry to the activity log.
pub async fn append_activity(pool: &DbPool, input: CreateActivity) -> Result<Activity> {
    sqlx::query_as::<_, Activity>(
        r#"
        INSERT INTO activities (id, event_type, actor, project_id, subject_id, message, metadata)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(&input.event_type)
    .bind(&input.actor)
    .bind(&input.project_id)
    .bind(&input.subject_id)
    .bind(&input.message)
    .bind(&input.metadata)
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// List activity entries matching a filter, newest first.
pub async fn list_activities(
    pool: &DbPool,
    filter: &ActivityFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Activity>> {
    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(project_id) = &filter.project_id {
        conditions.push("project_id = ?");
        bindings.push(project_id.clone());
    }
    if let Some(subject_id) = &filter.subject_id {
        conditions.push("subject_id = ?");
        bindings.push(subject_id.clone());
    }
    if let Some(event_type) = &filter.event_type {
        conditions.push("event_type = ?");
        bindings.push(event_type.clone());
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let query = format!(
        "SELECT * FROM activities {} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        where_clause
    );

    let mut q = sqlx::query_as::<_, Activity>(&query);
    for binding in &bindings {
        q = q.bind(binding);
    }
    q = q.bind(limit).bind(offset);

    q.fetch_all(pool).await.map_err(Error::Database)
}

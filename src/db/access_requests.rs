//! Access request database queries.
//!
//! Request numbers are allocated per calendar year (CAR-2025-0001,
//! CAR-2025-0002, ...). A partial unique index keeps at most one open
//! request per user and project; closed requests remain as history.

use chrono::{DateTime, Datelike, Utc};

use crate::models::{format_request_number, to_db_timestamp, AccessRequest, RequestStatus};
use crate::{Error, Result};

use super::DbPool;

// ============================================================================
// Types
// ============================================================================

/// Input for creating a new access request.
#[derive(Debug, Clone)]
pub struct CreateAccessRequest {
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    pub reason: Option<String>,
}

/// Fields written when a pending request is approved.
#[derive(Debug, Clone)]
pub struct ApproveRequest {
    pub reviewed_by: String,
    pub review_notes: Option<String>,
    pub repo_url: Option<String>,
    pub download_url: Option<String>,
    pub download_expires_at: Option<DateTime<Utc>>,
    pub approved_at: DateTime<Utc>,
}

/// Filter for listing access requests.
#[derive(Debug, Clone, Default)]
pub struct AccessRequestFilter {
    pub user_id: Option<String>,
    pub project_id: Option<String>,
    pub status: Option<RequestStatus>,
}

// ============================================================================
// Queries
// ============================================================================

/// Next sequence value for request numbers in the given year.
pub async fn next_request_number(pool: &DbPool, year: i32) -> Result<i64> {
    // Sequence digits start at position 10: CAR-YYYY-NNNN
    let (next,): (i64,) = sqlx::query_as(
        r#"
        SELECT COALESCE(MAX(CAST(substr(request_number, 10) AS INTEGER)), 0) + 1
        FROM access_requests
        WHERE request_number LIKE ?
        "#,
    )
    .bind(format!("CAR-{}-%", year))
    .fetch_one(pool)
    .await?;
    Ok(next)
}

/// Create a new access request in the pending state.
///
/// Rejects the insert with a Conflict when the user already has an
/// open (pending or approved) request for the same project. The
/// partial unique index backs this up under concurrent inserts.
pub async fn create_access_request(
    pool: &DbPool,
    input: CreateAccessRequest,
    requested_at: DateTime<Utc>,
    auto_approve_at: DateTime<Utc>,
) -> Result<AccessRequest> {
    let existing: Option<(String,)> = sqlx::query_as(
        r#"
        SELECT request_number FROM access_requests
        WHERE user_id = ? AND project_id = ? AND status IN ('pending', 'approved')
        LIMIT 1
        "#,
    )
    .bind(&input.user_id)
    .bind(&input.project_id)
    .fetch_optional(pool)
    .await?;

    if let Some((number,)) = existing {
        return Err(Error::Conflict(format!(
            "User '{}' already has an open request for this project: {}",
            input.user_id, number
        )));
    }

    let seq = next_request_number(pool, requested_at.year()).await?;
    let request_number = format_request_number(requested_at.year(), seq);

    sqlx::query_as::<_, AccessRequest>(
        r#"
        INSERT INTO access_requests (id, request_number, user_id, project_id, reason, status, auto_approve_at)
        VALUES (?, ?, ?, ?, ?, 'pending', ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(&request_number)
    .bind(&input.user_id)
    .bind(&input.project_id)
    .bind(&input.reason)
    .bind(to_db_timestamp(auto_approve_at))
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => Error::Conflict(
            format!(
                "Duplicate access request for user '{}' and project '{}'",
                input.user_id, input.project_id
            ),
        ),
        _ => Error::Database(e),
    })
}

/// Get an access request by ID.
pub async fn get_access_request(pool: &DbPool, id: &str) -> Result<AccessRequest> {
    sqlx::query_as::<_, AccessRequest>("SELECT * FROM access_requests WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Access request not found: {}", id)))
}

/// Pending requests whose auto-approval deadline has passed.
pub async fn list_eligible_for_auto_approval(
    pool: &DbPool,
    now: DateTime<Utc>,
) -> Result<Vec<AccessRequest>> {
    sqlx::query_as::<_, AccessRequest>(
        r#"
        SELECT * FROM access_requests
        WHERE status = 'pending' AND auto_approve_at <= ?
        ORDER BY auto_approve_at ASC
        "#,
    )
    .bind(to_db_timestamp(now))
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Approve a request if it is still pending.
///
/// The status guard in the WHERE clause is the serialization point:
/// of two concurrent approvals only one sees rows_affected = 1.
/// Returns false when the request was already reviewed (or missing).
pub async fn approve_request_if_pending(
    pool: &DbPool,
    id: &str,
    fields: &ApproveRequest,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE access_requests SET
            status = 'approved',
            access_granted = 1,
            access_granted_at = ?,
            repo_url = ?,
            download_url = ?,
            download_expires_at = ?,
            review_notes = ?,
            reviewed_by = ?,
            reviewed_at = ?,
            updated_at = datetime('now')
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(to_db_timestamp(fields.approved_at))
    .bind(&fields.repo_url)
    .bind(&fields.download_url)
    .bind(fields.download_expires_at.map(to_db_timestamp))
    .bind(&fields.review_notes)
    .bind(&fields.reviewed_by)
    .bind(to_db_timestamp(fields.approved_at))
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Reject a request if it is still pending.
///
/// Returns false when the request was already reviewed (or missing).
pub async fn reject_request_if_pending(
    pool: &DbPool,
    id: &str,
    reviewed_by: &str,
    review_notes: Option<&str>,
    rejected_at: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE access_requests SET
            status = 'rejected',
            review_notes = ?,
            reviewed_by = ?,
            reviewed_at = ?,
            updated_at = datetime('now')
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(review_notes)
    .bind(reviewed_by)
    .bind(to_db_timestamp(rejected_at))
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// List access requests matching a filter, newest first.
pub async fn list_access_requests(
    pool: &DbPool,
    filter: &AccessRequestFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<AccessRequest>> {
    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(user_id) = &filter.user_id {
        conditions.push("user_id = ?");
        bindings.push(user_id.clone());
    }
    if let Some(project_id) = &filter.project_id {
        conditions.push("project_id = ?");
        bindings.push(project_id.clone());
    }
    if let Some(status) = filter.status {
        conditions.push("status = ?");
        bindings.push(status.as_str().to_string());
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let query = format!(
        "SELECT * FROM access_requests {} ORDER BY created_at DESC, request_number DESC LIMIT ? OFFSET ?",
        where_clause
    );

    let mut q = sqlx::query_as::<_, AccessRequest>(&query);
    for binding in &bindings {
        q = q.bind(binding);
    }
    q = q.bind(limit).bind(offset);

    q.fetch_all(pool).await.map_err(Error::Database)
}

/// Count access requests matching a filter.
pub async fn count_access_requests(pool: &DbPool, filter: &AccessRequestFilter) -> Result<i64> {
    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(user_id) = &filter.user_id {
        conditions.push("user_id = ?");
        bindings.push(user_id.clone());
    }
    if let Some(project_id) = &filter.project_id {
        conditions.push("project_id = ?");
        bindings.push(project_id.clone());
    }
    if let Some(status) = filter.status {
        conditions.push("status = ?");
        bindings.push(status.as_str().to_string());
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let query = format!("SELECT COUNT(*) FROM access_requests {}", where_clause);

    let mut q = sqlx::query_as::<_, (i64,)>(&query);
    for binding in &bindings {
        q = q.bind(binding);
    }

    let (count,) = q.fetch_one(pool).await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_project, init_pool, migrate, CreateProject};
    use chrono::{Duration, TimeZone};

    async fn setup_test_db() -> DbPool {
        let pool = init_pool(":memory:").await.unwrap();
        migrate(&pool).await.unwrap();

        create_project(
            &pool,
            CreateProject {
                id: "proj-1".to_string(),
                slug: "client-portal".to_string(),
                name: "Client Portal".to_string(),
                client_id: None,
                description: None,
                repo_url: Some("https://git.example.com/client-portal".to_string()),
                download_url: None,
                tech_stack: None,
                status: "active".to_string(),
            },
        )
        .await
        .unwrap();

        pool
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    async fn create_request(pool: &DbPool, id: &str, user_id: &str) -> AccessRequest {
        let now = fixed_now();
        create_access_request(
            pool,
            CreateAccessRequest {
                id: id.to_string(),
                user_id: user_id.to_string(),
                project_id: "proj-1".to_string(),
                reason: Some("Need the source".to_string()),
            },
            now,
            now + Duration::hours(24),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_request_numbers_increment_within_year() {
        let pool = setup_test_db().await;

        let first = create_request(&pool, "req-1", "user-1").await;
        let second = create_request(&pool, "req-2", "user-2").await;

        assert_eq!(first.request_number, "CAR-2025-0001");
        assert_eq!(second.request_number, "CAR-2025-0002");
    }

    #[tokio::test]
    async fn test_request_numbers_reset_per_year() {
        let pool = setup_test_db().await;

        create_request(&pool, "req-1", "user-1").await;

        let next_year = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();
        let request = create_access_request(
            &pool,
            CreateAccessRequest {
                id: "req-2".to_string(),
                user_id: "user-2".to_string(),
                project_id: "proj-1".to_string(),
                reason: None,
            },
            next_year,
            next_year + Duration::hours(24),
        )
        .await
        .unwrap();

        assert_eq!(request.request_number, "CAR-2026-0001");
    }

    #[tokio::test]
    async fn test_open_request_conflict() {
        let pool = setup_test_db().await;

        create_request(&pool, "req-1", "user-1").await;

        let now = fixed_now();
        let result = create_access_request(
            &pool,
            CreateAccessRequest {
                id: "req-2".to_string(),
                user_id: "user-1".to_string(),
                project_id: "proj-1".to_string(),
                reason: None,
            },
            now,
            now + Duration::hours(24),
        )
        .await;

        assert!(matches!(result, Err(Error::Conflict(_))));
    }

    #[tokio::test]
    async fn test_new_request_allowed_after_rejection() {
        let pool = setup_test_db().await;

        let request = create_request(&pool, "req-1", "user-1").await;
        let rejected =
            reject_request_if_pending(&pool, &request.id, "admin", Some("Not yet"), fixed_now())
                .await
                .unwrap();
        assert!(rejected);

        // The old request is closed, so a fresh one is allowed
        let second = create_request(&pool, "req-2", "user-1").await;
        assert_eq!(second.request_number, "CAR-2025-0002");
    }

    #[tokio::test]
    async fn test_eligibility_boundary_is_inclusive() {
        let pool = setup_test_db().await;

        let request = create_request(&pool, "req-1", "user-1").await;
        let deadline = fixed_now() + Duration::hours(24);

        let before = list_eligible_for_auto_approval(&pool, deadline - Duration::seconds(1))
            .await
            .unwrap();
        assert!(before.is_empty());

        let at_deadline = list_eligible_for_auto_approval(&pool, deadline).await.unwrap();
        assert_eq!(at_deadline.len(), 1);
        assert_eq!(at_deadline[0].id, request.id);
    }

    #[tokio::test]
    async fn test_approve_if_pending_only_once() {
        let pool = setup_test_db().await;

        let request = create_request(&pool, "req-1", "user-1").await;
        let fields = ApproveRequest {
            reviewed_by: "admin".to_string(),
            review_notes: Some("Looks fine".to_string()),
            repo_url: Some("https://git.example.com/client-portal".to_string()),
            download_url: None,
            download_expires_at: Some(fixed_now() + Duration::days(30)),
            approved_at: fixed_now(),
        };

        let first = approve_request_if_pending(&pool, &request.id, &fields)
            .await
            .unwrap();
        assert!(first);

        let second = approve_request_if_pending(&pool, &request.id, &fields)
            .await
            .unwrap();
        assert!(!second);

        let stored = get_access_request(&pool, &request.id).await.unwrap();
        assert_eq!(stored.status, "approved");
        assert!(stored.is_access_granted());
        assert_eq!(
            stored.repo_url.as_deref(),
            Some("https://git.example.com/client-portal")
        );
        assert!(stored.download_expires_at.is_some());
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let pool = setup_test_db().await;

        let request = create_request(&pool, "req-1", "user-1").await;
        create_request(&pool, "req-2", "user-2").await;

        reject_request_if_pending(&pool, &request.id, "admin", None, fixed_now())
            .await
            .unwrap();

        let pending = list_access_requests(
            &pool,
            &AccessRequestFilter {
                status: Some(RequestStatus::Pending),
                ..Default::default()
            },
            50,
            0,
        )
        .await
        .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "req-2");

        let for_user = count_access_requests(
            &pool,
            &AccessRequestFilter {
                user_id: Some("user-1".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(for_user, 1);
    }
}

//! Integration tests for OpsDesk database operations.
//!
//! Cross-module flows that single-module unit tests do not cover.

use chrono::{Duration, TimeZone, Utc};
use opsdesk::db;
use opsdesk::models::RunStatus;
use opsdesk::Result;

// ============================================================================
// Setup Helpers
// ============================================================================

async fn setup() -> Result<db::DbPool> {
    let pool = db::init_pool(":memory:").await?;
    db::migrate(&pool).await?;
    Ok(pool)
}

async fn seed_project(pool: &db::DbPool, slug: &str) -> Result<String> {
    let project = db::create_project(
        pool,
        db::CreateProject {
            id: format!("proj-{}", slug),
            slug: slug.to_string(),
            name: format!("Project {}", slug),
            client_id: None,
            description: None,
            repo_url: Some(format!("https://github.com/agency/{}", slug)),
            download_url: None,
            tech_stack: None,
            status: "active".to_string(),
        },
    )
    .await?;
    Ok(project.id)
}

// ============================================================================
// Database Integration Tests
// ============================================================================

/// Schema applies and every domain table is queryable
#[tokio::test]
async fn test_database_init_and_schema() -> Result<()> {
    let pool = setup().await?;

    for table in [
        "projects",
        "access_requests",
        "notifications",
        "activities",
        "cron_runs",
    ] {
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&pool)
            .await?;
        assert_eq!(count, 0, "{} should start empty", table);
    }

    Ok(())
}

/// Request numbers increment within a year and restart across years
#[tokio::test]
async fn test_request_numbering_per_year() -> Result<()> {
    let pool = setup().await?;
    let project_id = seed_project(&pool, "portal").await?;

    let in_2025 = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
    let in_2026 = Utc.with_ymd_and_hms(2026, 1, 2, 9, 0, 0).unwrap();

    let first = db::create_access_request(
        &pool,
        db::CreateAccessRequest {
            id: "req-1".to_string(),
            user_id: "user-1".to_string(),
            project_id: project_id.clone(),
            reason: None,
        },
        in_2025,
        in_2025 + Duration::hours(24),
    )
    .await?;
    assert_eq!(first.request_number, "CAR-2025-0001");

    let second = db::create_access_request(
        &pool,
        db::CreateAccessRequest {
            id: "req-2".to_string(),
            user_id: "user-2".to_string(),
            project_id: project_id.clone(),
            reason: None,
        },
        in_2025,
        in_2025 + Duration::hours(24),
    )
    .await?;
    assert_eq!(second.request_number, "CAR-2025-0002");

    let next_year = db::create_access_request(
        &pool,
        db::CreateAccessRequest {
            id: "req-3".to_string(),
            user_id: "user-3".to_string(),
            project_id,
            reason: None,
        },
        in_2026,
        in_2026 + Duration::hours(24),
    )
    .await?;
    assert_eq!(next_year.request_number, "CAR-2026-0001");

    Ok(())
}

/// A closed request frees the (user, project) slot for a new one
#[tokio::test]
async fn test_reject_frees_slot_for_new_request() -> Result<()> {
    let pool = setup().await?;
    let project_id = seed_project(&pool, "portal").await?;
    let now = Utc::now();

    let first = db::create_access_request(
        &pool,
        db::CreateAccessRequest {
            id: "req-1".to_string(),
            user_id: "user-1".to_string(),
            project_id: project_id.clone(),
            reason: None,
        },
        now,
        now + Duration::hours(24),
    )
    .await?;

    // Second open request for the same pair is rejected
    let duplicate = db::create_access_request(
        &pool,
        db::CreateAccessRequest {
            id: "req-2".to_string(),
            user_id: "user-1".to_string(),
            project_id: project_id.clone(),
            reason: None,
        },
        now,
        now + Duration::hours(24),
    )
    .await;
    assert!(matches!(duplicate, Err(opsdesk::Error::Conflict(_))));

    let closed = db::reject_request_if_pending(&pool, &first.id, "admin", None, now).await?;
    assert!(closed);

    // The rejected request is history; a fresh one goes through
    let replacement = db::create_access_request(
        &pool,
        db::CreateAccessRequest {
            id: "req-3".to_string(),
            user_id: "user-1".to_string(),
            project_id,
            reason: Some("Second attempt".to_string()),
        },
        now,
        now + Duration::hours(24),
    )
    .await?;
    assert_eq!(replacement.status, "pending");
    assert_ne!(replacement.request_number, first.request_number);

    Ok(())
}

/// Approval is a one-shot transition; later attempts see rows_affected 0
#[tokio::test]
async fn test_conditional_transitions_exclude_each_other() -> Result<()> {
    let pool = setup().await?;
    let project_id = seed_project(&pool, "portal").await?;
    let now = Utc::now();

    let request = db::create_access_request(
        &pool,
        db::CreateAccessRequest {
            id: "req-1".to_string(),
            user_id: "user-1".to_string(),
            project_id,
            reason: None,
        },
        now,
        now,
    )
    .await?;

    let fields = db::ApproveRequest {
        reviewed_by: "admin".to_string(),
        review_notes: None,
        repo_url: None,
        download_url: None,
        download_expires_at: None,
        approved_at: now,
    };

    assert!(db::approve_request_if_pending(&pool, &request.id, &fields).await?);
    // Already approved: neither transition applies anymore
    assert!(!db::approve_request_if_pending(&pool, &request.id, &fields).await?);
    assert!(!db::reject_request_if_pending(&pool, &request.id, "admin", None, now).await?);

    Ok(())
}

/// The bookkeeping upsert accumulates run_count and replaces the rest
#[tokio::test]
async fn test_cron_run_upsert_accumulates() -> Result<()> {
    let pool = setup().await?;
    let first_run = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
    let second_run = first_run + Duration::hours(1);

    db::record_run(
        &pool,
        db::RecordRun {
            name: "auto_approve_access_requests".to_string(),
            last_run_at: first_run,
            next_run_at: Some(second_run),
            status: RunStatus::Success,
            processed: 3,
            last_error: None,
        },
    )
    .await?;

    let updated = db::record_run(
        &pool,
        db::RecordRun {
            name: "auto_approve_access_requests".to_string(),
            last_run_at: second_run,
            next_run_at: Some(second_run + Duration::hours(1)),
            status: RunStatus::PartialSuccess,
            processed: 1,
            last_error: Some(r#"[{"stage":"load_project"}]"#.to_string()),
        },
    )
    .await?;

    assert_eq!(updated.run_count, 2);
    assert_eq!(updated.processed, 1);
    assert_eq!(updated.status, "partial_success");
    assert!(updated.last_error.is_some());

    let fetched = db::get_run(&pool, "auto_approve_access_requests")
        .await?
        .expect("run exists");
    assert_eq!(fetched.run_count, 2);

    Ok(())
}

/// Partial project updates leave other columns alone
#[tokio::test]
async fn test_project_update_preserves_unset_fields() -> Result<()> {
    let pool = setup().await?;
    let project_id = seed_project(&pool, "portal").await?;

    let updated = db::update_project(
        &pool,
        &project_id,
        db::UpdateProject {
            description: Some("Client-facing portal".to_string()),
            ..Default::default()
        },
    )
    .await?;

    assert_eq!(updated.description.as_deref(), Some("Client-facing portal"));
    assert_eq!(updated.slug, "portal");
    assert_eq!(
        updated.repo_url.as_deref(),
        Some("https://github.com/agency/portal")
    );

    Ok(())
}

/// Listing crosses modules: requests filtered per project and status
#[tokio::test]
async fn test_request_listing_filters() -> Result<()> {
    let pool = setup().await?;
    let portal = seed_project(&pool, "portal").await?;
    let booking = seed_project(&pool, "booking").await?;
    let now = Utc::now();

    for (id, user, project) in [
        ("req-1", "user-1", &portal),
        ("req-2", "user-2", &portal),
        ("req-3", "user-1", &booking),
    ] {
        db::create_access_request(
            &pool,
            db::CreateAccessRequest {
                id: id.to_string(),
                user_id: user.to_string(),
                project_id: project.clone(),
                reason: None,
            },
            now,
            now + Duration::hours(24),
        )
        .await?;
    }

    let fields = db::ApproveRequest {
        reviewed_by: "admin".to_string(),
        review_notes: None,
        repo_url: None,
        download_url: None,
        download_expires_at: None,
        approved_at: now,
    };
    db::approve_request_if_pending(&pool, "req-2", &fields).await?;

    let portal_requests = db::list_access_requests(
        &pool,
        &db::AccessRequestFilter {
            project_id: Some(portal.clone()),
            ..Default::default()
        },
        50,
        0,
    )
    .await?;
    assert_eq!(portal_requests.len(), 2);

    let pending_for_user_one = db::list_access_requests(
        &pool,
        &db::AccessRequestFilter {
            user_id: Some("user-1".to_string()),
            status: Some(opsdesk::models::RequestStatus::Pending),
            ..Default::default()
        },
        50,
        0,
    )
    .await?;
    assert_eq!(pending_for_user_one.len(), 2);

    let total_pending = db::count_access_requests(
        &pool,
        &db::AccessRequestFilter {
            status: Some(opsdesk::models::RequestStatus::Pending),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(total_pending, 2);

    Ok(())
}

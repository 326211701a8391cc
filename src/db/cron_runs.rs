//! Bookkeeping queries for scheduled rules.
//!
//! Each rule keeps exactly one row keyed by name, upserted after
//! every run with a monotonically increasing run_count.

use chrono::{DateTime, Utc};

use crate::models::{to_db_timestamp, CronRun, RunStatus};
use crate::{Error, Result};

use super::DbPool;

/// Outcome of one rule run to persist.
#[derive(Debug, Clone)]
pub struct RecordRun {
    pub name: String,
    pub last_run_at: DateTime<Utc>,
    pub next_run_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub processed: i64,
    /// JSON array of per-item errors, when any
    pub last_error: Option<String>,
}

/// Upsert the bookkeeping row for a rule run.
pub async fn record_run(pool: &DbPool, run: RecordRun) -> Result<CronRun> {
    sqlx::query_as::<_, CronRun>(
        r#"
        INSERT INTO cron_runs (name, last_run_at, next_run_at, status, run_count, processed, last_error, updated_at)
        VALUES (?, ?, ?, ?, 1, ?, ?, datetime('now'))
        ON CONFLICT (name) DO UPDATE SET
            last_run_at = excluded.last_run_at,
            next_run_at = excluded.next_run_at,
            status = excluded.status,
            run_count = cron_runs.run_count + 1,
            processed = excluded.processed,
            last_error = excluded.last_error,
            updated_at = datetime('now')
        RETURNING *
        "#,
    )
    .bind(&run.name)
    .bind(to_db_timestamp(run.last_run_at))
    .bind(run.next_run_at.map(to_db_timestamp))
    .bind(run.status.as_str())
    .bind(run.processed)
    .bind(&run.last_error)
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// Get the bookkeeping row for a rule, if it has ever run.
pub async fn get_run(pool: &DbPool, name: &str) -> Result<Option<CronRun>> {
    sqlx::query_as::<_, CronRun>("SELECT * FROM cron_runs WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await
        .map_err(Error::Database)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_pool, migrate};
    use chrono::Duration;

    async fn setup_test_db() -> DbPool {
        let pool = init_pool(":memory:").await.unwrap();
        migrate(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_record_run_upserts() {
        let pool = setup_test_db().await;
        let now = Utc::now();

        let first = record_run(
            &pool,
            RecordRun {
                name: "auto_approve_access_requests".to_string(),
                last_run_at: now,
                next_run_at: Some(now + Duration::hours(1)),
                status: RunStatus::Success,
                processed: 3,
                last_error: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(first.run_count, 1);
        assert_eq!(first.processed, 3);
        assert_eq!(first.run_status(), Some(RunStatus::Success));

        let second = record_run(
            &pool,
            RecordRun {
                name: "auto_approve_access_requests".to_string(),
                last_run_at: now + Duration::hours(1),
                next_run_at: Some(now + Duration::hours(2)),
                status: RunStatus::PartialSuccess,
                processed: 1,
                last_error: Some(r#"[{"stage":"load_project"}]"#.to_string()),
            },
        )
        .await
        .unwrap();

        assert_eq!(second.run_count, 2);
        assert_eq!(second.processed, 1);
        assert_eq!(second.status, "partial_success");
        assert!(second.last_error.is_some());
    }

    #[tokio::test]
    async fn test_get_run_missing() {
        let pool = setup_test_db().await;
        let run = get_run(&pool, "never_ran").await.unwrap();
        assert!(run.is_none());
    }
}

//! Application state shared across all request handlers.

use crate::config;
use crate::services::{ApprovalSettings, AutoApprovalService};
use crate::Result;

/// Shared application state.
///
/// Cloning is cheap; the pool and services are handles around shared
/// internals.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: crate::db::DbPool,
    /// Auto-approval service (scan logic plus project lookup cache)
    pub approvals: AutoApprovalService,
}

impl AppState {
    /// Initialize application state from configuration.
    ///
    /// Opens the database, applies the schema, and wires up the
    /// services.
    pub async fn new() -> Result<Self> {
        let config = config::config();

        let db = crate::db::init_pool(&config.database.path).await?;
        crate::db::initialize_schema(&db).await?;

        Ok(Self::with_pool(db, ApprovalSettings::from_config(config)))
    }

    /// Build state around an existing pool. Tests use this with an
    /// in-memory database.
    pub fn with_pool(db: crate::db::DbPool, settings: ApprovalSettings) -> Self {
        let approvals = AutoApprovalService::new(db.clone(), settings);
        Self { db, approvals }
    }
}

//! API routes.
//!
//! This module combines all API routes into a single router.
//! Routes are organized by resource.

mod access_requests;
mod activity;
mod content;
mod cron;
mod estimates;
mod notifications;
mod projects;
pub mod status;

use axum::Router;

use crate::AppState;

/// Build the complete API router.
///
/// Route structure:
/// - /health, /status - Health checks and system status
/// - /estimates/* - Cost estimates and the pricing catalog
/// - /content/* - Content metadata extraction
/// - /projects/* - Project management
/// - /access-requests/* - Code access requests and reviews
/// - /notifications/* - Notification feed
/// - /activity - Activity log feed
/// - /cron/* - Scheduled rule triggers and bookkeeping
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(status::routes())
        .nest("/estimates", estimates::routes())
        .nest("/content", content::routes())
        .nest("/projects", projects::routes())
        .nest("/access-requests", access_requests::routes())
        .nest("/notifications", notifications::routes())
        .nest("/activity", activity::routes())
        .nest("/cron", cron::routes())
}

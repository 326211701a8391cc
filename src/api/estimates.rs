//! Estimate Routes
//!
//! Cost estimation for project configurations.
//!
//! Routes:
//! - POST /estimates - Compute an estimate for a configuration
//! - GET /estimates/catalog - Archetype, feature, and timeline tables

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::services::estimator::{
    self, Estimate, EstimateInput, EstimatorCatalog, FeatureAddon, ProjectArchetype,
    TimelinePreference,
};
use crate::{AppState, Error, Result};

/// Build estimate routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(compute_estimate))
        .route("/catalog", get(get_catalog))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request for a cost estimate.
#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    /// Archetype key, e.g. "website" or "saas_platform"
    pub archetype: String,
    /// Feature add-on keys; duplicates count once
    #[serde(default)]
    pub features: Vec<String>,
    /// "urgent", "normal", or "flexible" (default "normal")
    pub timeline: Option<String>,
    pub page_count: Option<i64>,
    pub user_count: Option<i64>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Compute a cost estimate.
///
/// POST /estimates
///
/// Validates the configuration against the closed archetype, feature,
/// and timeline sets, then runs the pure estimator. Unknown names and
/// negative counts are rejected before any computation.
#[axum::debug_handler]
async fn compute_estimate(Json(request): Json<EstimateRequest>) -> Result<Json<Estimate>> {
    let archetype = ProjectArchetype::from_str(&request.archetype)
        .ok_or_else(|| Error::Validation(format!("Unknown archetype: {}", request.archetype)))?;

    let mut features = Vec::with_capacity(request.features.len());
    for name in &request.features {
        let feature = FeatureAddon::from_str(name)
            .ok_or_else(|| Error::Validation(format!("Unknown feature: {}", name)))?;
        features.push(feature);
    }

    let timeline = match &request.timeline {
        Some(name) => TimelinePreference::from_str(name)
            .ok_or_else(|| Error::Validation(format!("Unknown timeline: {}", name)))?,
        None => TimelinePreference::default(),
    };

    let input = EstimateInput {
        archetype,
        features,
        timeline,
        page_count: validate_count("page_count", request.page_count)?,
        user_count: validate_count("user_count", request.user_count)?,
    };

    Ok(Json(estimator::estimate(&input)))
}

/// Pricing catalog.
///
/// GET /estimates/catalog
///
/// Returns the archetype, feature, and timeline tables used to build
/// a pricing page.
#[axum::debug_handler]
async fn get_catalog() -> Json<EstimatorCatalog> {
    Json(estimator::catalog())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Bound a raw count: negative values are rejected outright.
fn validate_count(field: &str, value: Option<i64>) -> Result<Option<u32>> {
    match value {
        None => Ok(None),
        Some(v) if v < 0 => Err(Error::Validation(format!("{} must not be negative", field))),
        Some(v) => u32::try_from(v)
            .map(Some)
            .map_err(|_| Error::Validation(format!("{} is too large", field))),
    }
}

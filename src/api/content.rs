//! Content Routes
//!
//! SEO metadata extraction for articles.
//!
//! Routes:
//! - POST /content/analyze - Derive metadata from a title and HTML body

use axum::{routing::post, Json, Router};
use serde::Deserialize;

use crate::services::seo::{self, SeoMetadata};
use crate::AppState;

/// Build content routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/analyze", post(analyze_content))
}

/// Request to analyze article content.
#[derive(Debug, Deserialize)]
pub struct AnalyzeContentRequest {
    pub title: String,
    /// HTML or plain-text body
    #[serde(default)]
    pub body: String,
}

/// Derive SEO metadata from article content.
///
/// POST /content/analyze
///
/// Pure text analysis; every input, including empty strings, produces
/// a well-defined result.
#[axum::debug_handler]
async fn analyze_content(Json(request): Json<AnalyzeContentRequest>) -> Json<SeoMetadata> {
    Json(seo::analyze(&request.title, &request.body))
}

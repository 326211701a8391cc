//! Projects Routes
//!
//! CRUD for the projects behind the client portal and the access rule.
//!
//! Routes:
//! - GET /projects - List projects
//! - POST /projects - Create a new project
//! - GET /projects/:id - Get project by ID or slug
//! - PUT /projects/:id - Update project

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{new_id, parse_datetime, Project, ProjectStatus};
use crate::services::seo;
use crate::{AppState, Error, Result};

/// Build project routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route("/:id", get(get_project).put(update_project))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing projects.
#[derive(Debug, Deserialize, Default)]
pub struct ListProjectsQuery {
    /// Pagination offset
    #[serde(default)]
    pub offset: u32,
    /// Pagination limit (default 20, max 100)
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    20
}

/// Request to create a new project.
#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    /// URL-friendly identifier; derived from the name when omitted
    pub slug: Option<String>,
    /// Human-readable name
    pub name: String,
    pub client_id: Option<String>,
    pub description: Option<String>,
    pub repo_url: Option<String>,
    pub download_url: Option<String>,
    /// Either a JSON array of strings or a comma-separated string
    pub tech_stack: Option<serde_json::Value>,
    /// "active", "completed", or "archived" (default "active")
    pub status: Option<String>,
}

/// Request to update a project.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub client_id: Option<String>,
    pub description: Option<String>,
    pub repo_url: Option<String>,
    pub download_url: Option<String>,
    /// Either a JSON array of strings or a comma-separated string
    pub tech_stack: Option<serde_json::Value>,
    pub status: Option<String>,
}

/// Project response.
#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub client_id: Option<String>,
    pub description: Option<String>,
    pub repo_url: Option<String>,
    pub download_url: Option<String>,
    pub tech_stack: Vec<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Project> for ProjectResponse {
    fn from(p: Project) -> Self {
        Self {
            tech_stack: p.tech_stack_list(),
            created_at: parse_datetime(&p.created_at),
            updated_at: parse_datetime(&p.updated_at),
            id: p.id,
            slug: p.slug,
            name: p.name,
            client_id: p.client_id,
            description: p.description,
            repo_url: p.repo_url,
            download_url: p.download_url,
            status: p.status,
        }
    }
}

/// List of projects response.
#[derive(Debug, Serialize)]
pub struct ListProjectsResponse {
    pub projects: Vec<ProjectResponse>,
    pub total: u32,
    pub offset: u32,
    pub limit: u32,
}

// ============================================================================
// Handlers
// ============================================================================

/// List all projects.
///
/// GET /projects
///
/// Returns a paginated list of projects ordered by name.
#[axum::debug_handler]
async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ListProjectsQuery>,
) -> Result<Json<ListProjectsResponse>> {
    let limit = query.limit.min(100);

    let projects =
        crate::db::list_projects(&state.db, limit as i64, query.offset as i64).await?;
    let total = crate::db::count_projects(&state.db).await? as u32;

    Ok(Json(ListProjectsResponse {
        projects: projects.into_iter().map(Into::into).collect(),
        total,
        offset: query.offset,
        limit,
    }))
}

/// Create a new project.
///
/// POST /projects
///
/// Creates a new project. The slug is validated when provided and
/// derived from the name otherwise.
#[axum::debug_handler]
async fn create_project(
    State(state): State<AppState>,
    Json(request): Json<CreateProjectRequest>,
) -> Result<Json<ProjectResponse>> {
    let slug = match request.slug {
        Some(slug) => {
            if !is_valid_slug(&slug) {
                return Err(Error::Validation(
                    "Slug must be lowercase alphanumeric with hyphens only".into(),
                ));
            }
            slug
        }
        None => {
            let derived = seo::slugify(&request.name);
            if derived.is_empty() {
                return Err(Error::Validation(
                    "Cannot derive a slug from the project name; provide one explicitly".into(),
                ));
            }
            derived
        }
    };

    let status = match &request.status {
        Some(s) => ProjectStatus::from_str(s)
            .ok_or_else(|| Error::Validation(format!("Unknown project status: {}", s)))?,
        None => ProjectStatus::default(),
    };

    let tech_stack = match &request.tech_stack {
        Some(value) => normalize_tech_stack(value)?,
        None => None,
    };

    let input = crate::db::CreateProject {
        id: new_id(),
        slug,
        name: request.name,
        client_id: request.client_id,
        description: request.description,
        repo_url: request.repo_url,
        download_url: request.download_url,
        tech_stack,
        status: status.as_str().to_string(),
    };

    let project = crate::db::create_project(&state.db, input).await?;
    info!(slug = %project.slug, "Created project");

    Ok(Json(project.into()))
}

/// Get a project by ID or slug.
///
/// GET /projects/:id
#[axum::debug_handler]
async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProjectResponse>> {
    let project = crate::db::get_project_by_id_or_slug(&state.db, &id).await?;
    Ok(Json(project.into()))
}

/// Update a project.
///
/// PUT /projects/:id
///
/// Updates the project with the given ID or slug. Slug changes are
/// not allowed through this endpoint.
#[axum::debug_handler]
async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateProjectRequest>,
) -> Result<Json<ProjectResponse>> {
    let existing = crate::db::get_project_by_id_or_slug(&state.db, &id).await?;

    let status = match &request.status {
        Some(s) => Some(
            ProjectStatus::from_str(s)
                .ok_or_else(|| Error::Validation(format!("Unknown project status: {}", s)))?
                .as_str()
                .to_string(),
        ),
        None => None,
    };

    let tech_stack = match &request.tech_stack {
        Some(value) => normalize_tech_stack(value)?,
        None => None,
    };

    let input = crate::db::UpdateProject {
        name: request.name,
        client_id: request.client_id,
        description: request.description,
        repo_url: request.repo_url,
        download_url: request.download_url,
        tech_stack,
        status,
    };

    let project = crate::db::update_project(&state.db, &existing.id, input).await?;

    // Approval runs must not serve stale repo or download URLs
    state.approvals.invalidate_project(&project.id);

    Ok(Json(project.into()))
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Check if a string is a valid project slug.
fn is_valid_slug(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 64
        && s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !s.starts_with('-')
        && !s.ends_with('-')
}

/// Normalize a tech stack input to a JSON array string.
///
/// The column historically held either a JSON array or a comma-separated
/// list; every write converts to the array form so the ambiguity never
/// spreads to new rows.
fn normalize_tech_stack(value: &serde_json::Value) -> Result<Option<String>> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Array(items) => {
            let mut stack = Vec::with_capacity(items.len());
            for item in items {
                match item.as_str() {
                    Some(s) if !s.trim().is_empty() => stack.push(s.trim().to_string()),
                    Some(_) => {}
                    None => {
                        return Err(Error::Validation(
                            "tech_stack array entries must be strings".into(),
                        ))
                    }
                }
            }
            Ok(Some(serde_json::to_string(&stack)?))
        }
        serde_json::Value::String(s) => {
            let stack: Vec<String> = s
                .split(',')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect();
            Ok(Some(serde_json::to_string(&stack)?))
        }
        _ => Err(Error::Validation(
            "tech_stack must be an array of strings or a comma-separated string".into(),
        )),
    }
}

//! Project database queries.

use crate::models::Project;
use crate::{Error, Result};

use super::DbPool;

// ============================================================================
// Types
// ============================================================================

/// Input for creating a new project.
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub client_id: Option<String>,
    pub description: Option<String>,
    pub repo_url: Option<String>,
    pub download_url: Option<String>,
    /// JSON array of technology names
    pub tech_stack: Option<String>,
    pub status: String,
}

/// Input for updating a project.
#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub client_id: Option<String>,
    pub description: Option<String>,
    pub repo_url: Option<String>,
    pub download_url: Option<String>,
    /// JSON array of technology names
    pub tech_stack: Option<String>,
    pub status: Option<String>,
}

// ============================================================================
// Queries
// ============================================================================

/// Create a new project.
pub async fn create_project(pool: &DbPool, input: CreateProject) -> Result<Project> {
    sqlx::query_as::<_, Project>(
        r#"
        INSERT INTO projects (id, slug, name, client_id, description, repo_url, download_url, tech_stack, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(&input.slug)
    .bind(&input.name)
    .bind(&input.client_id)
    .bind(&input.description)
    .bind(&input.repo_url)
    .bind(&input.download_url)
    .bind(&input.tech_stack)
    .bind(&input.status)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            Error::AlreadyExists(format!("Project with slug '{}' already exists", input.slug))
        }
        _ => Error::Database(e),
    })
}

/// Get a project by ID.
pub async fn get_project(pool: &DbPool, id: &str) -> Result<Project> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Project not found: {}", id)))
}

/// Get a project by ID or slug.
pub async fn get_project_by_id_or_slug(pool: &DbPool, id_or_slug: &str) -> Result<Project> {
    sqlx::query_as::<_, Project>(
        r#"
        SELECT * FROM projects
        WHERE id = ? OR slug = ?
        "#,
    )
    .bind(id_or_slug)
    .bind(id_or_slug)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Project not found: {}", id_or_slug)))
}

/// Update a project.
pub async fn update_project(pool: &DbPool, id: &str, input: UpdateProject) -> Result<Project> {
    let mut updates = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(name) = input.name {
        updates.push("name = ?");
        bindings.push(name);
    }
    if let Some(client_id) = input.client_id {
        updates.push("client_id = ?");
        bindings.push(client_id);
    }
    if let Some(description) = input.description {
        updates.push("description = ?");
        bindings.push(description);
    }
    if let Some(repo_url) = input.repo_url {
        updates.push("repo_url = ?");
        bindings.push(repo_url);
    }
    if let Some(download_url) = input.download_url {
        updates.push("download_url = ?");
        bindings.push(download_url);
    }
    if let Some(tech_stack) = input.tech_stack {
        updates.push("tech_stack = ?");
        bindings.push(tech_stack);
    }
    if let Some(status) = input.status {
        updates.push("status = ?");
        bindings.push(status);
    }

    if updates.is_empty() {
        return get_project(pool, id).await;
    }

    updates.push("updated_at = datetime('now')");

    let query = format!(
        "UPDATE projects SET {} WHERE id = ? RETURNING *",
        updates.join(", ")
    );

    let mut q = sqlx::query_as::<_, Project>(&query);
    for binding in &bindings {
        q = q.bind(binding);
    }
    q = q.bind(id);

    q.fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Project not found: {}", id)))
}

/// List projects with pagination.
pub async fn list_projects(pool: &DbPool, limit: i64, offset: i64) -> Result<Vec<Project>> {
    sqlx::query_as::<_, Project>(
        r#"
        SELECT * FROM projects
        ORDER BY name ASC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Count total projects.
pub async fn count_projects(pool: &DbPool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projects")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_pool, migrate};

    async fn setup_test_db() -> DbPool {
        let pool = init_pool(":memory:").await.unwrap();
        migrate(&pool).await.unwrap();
        pool
    }

    fn sample_project(id: &str, slug: &str) -> CreateProject {
        CreateProject {
            id: id.to_string(),
            slug: slug.to_string(),
            name: "Test Project".to_string(),
            client_id: Some("client-1".to_string()),
            description: Some("A test project".to_string()),
            repo_url: Some("https://git.example.com/test".to_string()),
            download_url: None,
            tech_stack: Some(r#"["Rust"]"#.to_string()),
            status: "active".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_project() {
        let pool = setup_test_db().await;

        let project = create_project(&pool, sample_project("proj-1", "test-project"))
            .await
            .unwrap();

        assert_eq!(project.id, "proj-1");
        assert_eq!(project.slug, "test-project");
        assert_eq!(project.tech_stack_list(), vec!["Rust"]);

        let fetched = get_project(&pool, "proj-1").await.unwrap();
        assert_eq!(fetched.name, "Test Project");
    }

    #[tokio::test]
    async fn test_get_project_by_id_or_slug() {
        let pool = setup_test_db().await;

        create_project(&pool, sample_project("proj-1", "my-project"))
            .await
            .unwrap();

        let by_slug = get_project_by_id_or_slug(&pool, "my-project").await.unwrap();
        assert_eq!(by_slug.id, "proj-1");

        let by_id = get_project_by_id_or_slug(&pool, "proj-1").await.unwrap();
        assert_eq!(by_id.slug, "my-project");
    }

    #[tokio::test]
    async fn test_duplicate_slug_error() {
        let pool = setup_test_db().await;

        create_project(&pool, sample_project("proj-1", "unique-slug"))
            .await
            .unwrap();

        let result = create_project(&pool, sample_project("proj-2", "unique-slug")).await;

        assert!(matches!(result, Err(Error::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_update_project() {
        let pool = setup_test_db().await;

        create_project(&pool, sample_project("proj-1", "update-me"))
            .await
            .unwrap();

        let updated = update_project(
            &pool,
            "proj-1",
            UpdateProject {
                name: Some("Renamed".to_string()),
                status: Some("completed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.status, "completed");
        // Untouched fields survive
        assert_eq!(updated.client_id.as_deref(), Some("client-1"));
    }

    #[tokio::test]
    async fn test_update_missing_project() {
        let pool = setup_test_db().await;

        let result = update_project(
            &pool,
            "no-such-id",
            UpdateProject {
                name: Some("Renamed".to_string()),
                ..Default::default()
            },
        )
        .await;

        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_projects() {
        let pool = setup_test_db().await;

        for i in 1..=3 {
            create_project(&pool, sample_project(&format!("proj-{}", i), &format!("project-{}", i)))
                .await
                .unwrap();
        }

        let projects = list_projects(&pool, 50, 0).await.unwrap();
        assert_eq!(projects.len(), 3);
        assert_eq!(count_projects(&pool).await.unwrap(), 3);
    }
}

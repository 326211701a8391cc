//! Project model for client engagements.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle status of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Archived => "archived",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(ProjectStatus::Active),
            "completed" => Some(ProjectStatus::Completed),
            "archived" => Some(ProjectStatus::Archived),
            _ => None,
        }
    }
}

/// Project record from the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    /// URL-safe identifier
    pub slug: String,
    pub name: String,
    pub client_id: Option<String>,
    pub description: Option<String>,

    /// Repository granted to approved access requests
    pub repo_url: Option<String>,
    /// Download bundle granted to approved access requests
    pub download_url: Option<String>,

    /// JSON array of technology names; legacy rows may hold a comma list
    pub tech_stack: Option<String>,

    pub status: String,

    pub created_at: String,
    pub updated_at: String,
}

impl Project {
    /// Get the typed status. Unknown values fall back to Active.
    pub fn project_status(&self) -> ProjectStatus {
        ProjectStatus::from_str(&self.status).unwrap_or_default()
    }

    /// Parse the tech stack column.
    ///
    /// Accepts a JSON array of strings or a legacy comma-separated
    /// list. Blank entries are dropped either way.
    pub fn tech_stack_list(&self) -> Vec<String> {
        let Some(raw) = self.tech_stack.as_deref() else {
            return Vec::new();
        };

        if let Ok(items) = serde_json::from_str::<Vec<String>>(raw) {
            return items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_with_stack(tech_stack: Option<&str>) -> Project {
        Project {
            id: "proj-1".to_string(),
            slug: "demo".to_string(),
            name: "Demo".to_string(),
            client_id: None,
            description: None,
            repo_url: None,
            download_url: None,
            tech_stack: tech_stack.map(String::from),
            status: "active".to_string(),
            created_at: "2024-01-01 00:00:00".to_string(),
            updated_at: "2024-01-01 00:00:00".to_string(),
        }
    }

    #[test]
    fn test_tech_stack_json_array() {
        let project = project_with_stack(Some(r#"["Rust", "SQLite"]"#));
        assert_eq!(project.tech_stack_list(), vec!["Rust", "SQLite"]);
    }

    #[test]
    fn test_tech_stack_legacy_comma_list() {
        let project = project_with_stack(Some("React, Node.js, , Postgres"));
        assert_eq!(
            project.tech_stack_list(),
            vec!["React", "Node.js", "Postgres"]
        );
    }

    #[test]
    fn test_tech_stack_missing() {
        let project = project_with_stack(None);
        assert!(project.tech_stack_list().is_empty());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(ProjectStatus::from_str("active"), Some(ProjectStatus::Active));
        assert_eq!(
            ProjectStatus::from_str("ARCHIVED"),
            Some(ProjectStatus::Archived)
        );
        assert_eq!(ProjectStatus::from_str("bogus"), None);
    }
}

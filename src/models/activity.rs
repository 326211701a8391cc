//! Activity log model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Activity record from the database.
///
/// Append-only audit trail of domain events.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    /// Dotted event name, e.g. `access_request.auto_approved`
    pub event_type: String,
    /// Who performed the action (user ID or system identity)
    pub actor: String,
    pub project_id: Option<String>,
    /// ID of the entity the event is about
    pub subject_id: Option<String>,
    pub message: String,
    /// JSON object with event-specific details
    pub metadata: Option<String>,
    pub created_at: String,
}

impl Activity {
    /// Parse the metadata column. Returns Null when absent or invalid.
    pub fn metadata_json(&self) -> serde_json::Value {
        self.metadata
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or(serde_json::Value::Null)
    }
}

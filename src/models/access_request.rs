//! Code access request model.
//!
//! Requests move from `pending` to either `approved` or `rejected`.
//! Pending requests are picked up by the auto-approval rule once
//! their `auto_approve_at` deadline passes.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Review state of an access request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(RequestStatus::Pending),
            "approved" => Some(RequestStatus::Approved),
            "rejected" => Some(RequestStatus::Rejected),
            _ => None,
        }
    }
}

/// Access request record from the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AccessRequest {
    pub id: String,
    /// Human-facing identifier, e.g. CAR-2025-0042
    pub request_number: String,
    pub user_id: String,
    pub project_id: String,
    pub reason: Option<String>,
    pub status: String,

    /// When the request becomes eligible for auto-approval
    pub auto_approve_at: String,

    pub access_granted: i32,
    pub access_granted_at: Option<String>,
    pub repo_url: Option<String>,
    pub download_url: Option<String>,
    pub download_expires_at: Option<String>,

    pub review_notes: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<String>,

    pub created_at: String,
    pub updated_at: String,
}

impl AccessRequest {
    /// Get the typed status. Unknown values fall back to Pending.
    pub fn request_status(&self) -> RequestStatus {
        RequestStatus::from_str(&self.status).unwrap_or_default()
    }

    pub fn is_access_granted(&self) -> bool {
        self.access_granted != 0
    }
}

/// Format a request number from a year and a sequence value.
pub fn format_request_number(year: i32, seq: i64) -> String {
    format!("CAR-{}-{:04}", year, seq)
}

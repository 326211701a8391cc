//! Bookkeeping for scheduled rules.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Outcome of a scheduled rule run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// All eligible items processed cleanly
    Success,
    /// Run completed but some items failed
    PartialSuccess,
    /// Run could not complete at all
    Error,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::PartialSuccess => "partial_success",
            RunStatus::Error => "error",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "success" => Some(RunStatus::Success),
            "partial_success" => Some(RunStatus::PartialSuccess),
            "error" => Some(RunStatus::Error),
            _ => None,
        }
    }
}

/// One row per rule; upserted after every run.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CronRun {
    pub name: String,
    pub last_run_at: String,
    pub next_run_at: Option<String>,
    pub status: String,
    /// Total runs recorded since the rule first fired
    pub run_count: i64,
    /// Items processed by the most recent run
    pub processed: i64,
    /// JSON array of per-item errors from the most recent run
    pub last_error: Option<String>,
    pub updated_at: String,
}

impl CronRun {
    pub fn run_status(&self) -> Option<RunStatus> {
        RunStatus::from_str(&self.status)
    }
}

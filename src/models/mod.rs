//! Data models for OpsDesk.
//!
//! Defines the core types used throughout the system including
//! projects, access requests, notifications, and activity entries.

mod access_request;
mod activity;
mod cron_run;
mod notification;
mod project;

pub use access_request::*;
pub use activity::*;
pub use cron_run::*;
pub use notification::*;
pub use project::*;

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

/// Generate a new UUID
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp for TEXT columns that get compared in SQL.
///
/// RFC3339 with fixed millisecond precision and a trailing Z, so
/// lexicographic ordering matches chronological ordering.
pub fn to_db_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a timestamp stored as TEXT.
///
/// Handles both RFC3339 values written by the application and the
/// `datetime('now')` format SQLite uses for column defaults.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .map(|naive| naive.and_utc())
        })
        .unwrap_or_else(|_| Utc::now())
}

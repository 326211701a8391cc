//! Notification model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Who a notification is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// A single user by ID
    User(String),
    /// The admin team as a whole
    Admins,
}

impl Recipient {
    pub fn recipient_type(&self) -> &'static str {
        match self {
            Recipient::User(_) => "user",
            Recipient::Admins => "admins",
        }
    }

    pub fn recipient_id(&self) -> Option<&str> {
        match self {
            Recipient::User(id) => Some(id),
            Recipient::Admins => None,
        }
    }
}

/// Display priority for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    #[default]
    Normal,
    High,
}

impl NotificationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPriority::Low => "low",
            NotificationPriority::Normal => "normal",
            NotificationPriority::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(NotificationPriority::Low),
            "normal" => Some(NotificationPriority::Normal),
            "high" => Some(NotificationPriority::High),
            _ => None,
        }
    }
}

/// Notification record from the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub recipient_type: String,
    pub recipient_id: Option<String>,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub priority: String,
    pub read_at: Option<String>,
    pub created_at: String,
}

impl Notification {
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_columns() {
        let user = Recipient::User("user-1".to_string());
        assert_eq!(user.recipient_type(), "user");
        assert_eq!(user.recipient_id(), Some("user-1"));

        let admins = Recipient::Admins;
        assert_eq!(admins.recipient_type(), "admins");
        assert_eq!(admins.recipient_id(), None);
    }
}

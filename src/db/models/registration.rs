use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::event::{EventCategory, EventFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Active,
    Cancelled,
}

impl RegistrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RegistrationStatus::Active => "active",
            RegistrationStatus::Cancelled => "cancelled",
        }
    }
}

/// Links one user to one event. At most one row exists per (user, event)
/// pair; re-registering after a cancellation reactivates the same row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Registration {
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub status: RegistrationStatus,
    pub created_at: NaiveDateTime,
}

impl Registration {
    pub fn is_active(&self) -> bool {
        self.status == RegistrationStatus::Active
    }
}

/// Registration joined with the registrant's profile, for participant
/// listings and broadcast fan-out.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EventParticipant {
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub status: RegistrationStatus,
    pub created_at: NaiveDateTime,
    pub first_name: String,
    pub username: Option<String>,
}

/// Registration joined with its event, for a user's "my events" view.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserRegistration {
    pub id: i64,
    pub event_id: i64,
    pub status: RegistrationStatus,
    pub title: String,
    pub category: EventCategory,
    pub format: EventFormat,
    pub starts_at: NaiveDateTime,
    pub location: String,
}

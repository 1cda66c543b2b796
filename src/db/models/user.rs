use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A Telegram account known to the service.
///
/// Keyed by the platform-assigned chat id; created or refreshed on first
/// interaction and never deleted by this service. The three notify flags
/// select which new-event announcements the user receives.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub username: Option<String>,
    pub notify_it: bool,
    pub notify_sport: bool,
    pub notify_books: bool,
    pub created_at: NaiveDateTime,
}

/// Payload for the idempotent user upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertUser {
    pub first_name: String,
    pub username: Option<String>,
}

/// Partial update of the notification flags. Each field is applied only when
/// present, in a single conditional UPDATE statement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyPrefsUpdate {
    pub notify_it: Option<bool>,
    pub notify_sport: Option<bool>,
    pub notify_books: Option<bool>,
}

impl NotifyPrefsUpdate {
    pub fn is_empty(&self) -> bool {
        self.notify_it.is_none() && self.notify_sport.is_none() && self.notify_books.is_none()
    }
}

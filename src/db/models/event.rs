use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Event category (closed set, mirrored by a CHECK constraint).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum EventCategory {
    It,
    Sport,
    Books,
}

impl EventCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            EventCategory::It => "it",
            EventCategory::Sport => "sport",
            EventCategory::Books => "books",
        }
    }

    /// Human-readable name used in outbound messages.
    pub fn display_name(self) -> &'static str {
        match self {
            EventCategory::It => "IT",
            EventCategory::Sport => "Спорт",
            EventCategory::Books => "Книги",
        }
    }
}

/// Event format (closed set, mirrored by a CHECK constraint).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum EventFormat {
    Online,
    Offline,
}

impl EventFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            EventFormat::Online => "online",
            EventFormat::Offline => "offline",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            EventFormat::Online => "онлайн",
            EventFormat::Offline => "оффлайн",
        }
    }
}

/// A published event. `is_cancelled` is monotonic: once set it is never
/// reversed, and no reminder for the event may fire afterwards.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub category: EventCategory,
    pub format: EventFormat,
    pub starts_at: NaiveDateTime,
    pub location: String,
    pub description: Option<String>,
    pub organizer_contact: String,
    pub is_cancelled: bool,
    pub created_at: NaiveDateTime,
}

/// Validated event-creation payload, supplied by the form/wizard frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub category: EventCategory,
    pub format: EventFormat,
    pub starts_at: NaiveDateTime,
    pub location: String,
    pub description: Option<String>,
    pub organizer_contact: String,
}

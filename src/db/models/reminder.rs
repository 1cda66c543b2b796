use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Fixed reminder offsets relative to an event's start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum ReminderType {
    #[serde(rename = "24h")]
    #[sqlx(rename = "24h")]
    DayBefore,
    #[serde(rename = "15min")]
    #[sqlx(rename = "15min")]
    SoonBefore,
}

impl ReminderType {
    pub const ALL: [ReminderType; 2] = [ReminderType::DayBefore, ReminderType::SoonBefore];

    pub fn as_str(self) -> &'static str {
        match self {
            ReminderType::DayBefore => "24h",
            ReminderType::SoonBefore => "15min",
        }
    }

    /// How long before the event start this reminder fires.
    pub fn offset(self) -> Duration {
        match self {
            ReminderType::DayBefore => Duration::hours(24),
            ReminderType::SoonBefore => Duration::minutes(15),
        }
    }

    pub fn fire_time(self, starts_at: NaiveDateTime) -> NaiveDateTime {
        starts_at - self.offset()
    }
}

/// A persisted reminder for one registration. `sent` is monotonic: the
/// delivery loop flips it after a delivered or permanently failed send, and
/// event-level cancellation flips it to suppress future delivery. `attempts`
/// counts transient failures so a stuck reminder can be abandoned.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ScheduledReminder {
    pub id: i64,
    pub registration_id: i64,
    pub remind_at: NaiveDateTime,
    pub reminder_type: ReminderType,
    pub sent: bool,
    pub attempts: i32,
}

/// A due reminder joined with everything the dispatcher needs to build and
/// address the message.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DueReminder {
    pub id: i64,
    pub registration_id: i64,
    pub remind_at: NaiveDateTime,
    pub reminder_type: ReminderType,
    pub attempts: i32,
    pub user_id: i64,
    pub event_id: i64,
    pub title: String,
    pub location: String,
    pub starts_at: NaiveDateTime,
    pub first_name: String,
}

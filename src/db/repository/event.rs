use chrono::NaiveDateTime;
use sqlx::SqlitePool;

use crate::db::models::{Event, EventCategory, NewEvent};
use crate::error::{AppError, AppResult};

const EVENT_COLUMNS: &str = "id, title, category, format, starts_at, location, description, \
                             organizer_contact, is_cancelled, created_at";

pub struct EventRepository;

impl EventRepository {
    /// Persist a new event and return the stored row including its assigned id.
    pub async fn create(pool: &SqlitePool, event: &NewEvent) -> AppResult<Event> {
        let row = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (title, category, format, starts_at, location, description, organizer_contact)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {EVENT_COLUMNS}
            "#,
        ))
        .bind(&event.title)
        .bind(event.category)
        .bind(event.format)
        .bind(event.starts_at)
        .bind(&event.location)
        .bind(&event.description)
        .bind(&event.organizer_contact)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> AppResult<Option<Event>> {
        let row = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Non-cancelled events starting after `now`, soonest first, optionally
    /// filtered by category and capped at `limit`.
    pub async fn list_upcoming(
        pool: &SqlitePool,
        category: Option<EventCategory>,
        limit: i64,
        now: NaiveDateTime,
    ) -> AppResult<Vec<Event>> {
        let rows = if let Some(category) = category {
            sqlx::query_as::<_, Event>(&format!(
                r#"
                SELECT {EVENT_COLUMNS} FROM events
                WHERE starts_at > ? AND is_cancelled = FALSE AND category = ?
                ORDER BY starts_at ASC
                LIMIT ?
                "#,
            ))
            .bind(now)
            .bind(category)
            .bind(limit)
            .fetch_all(pool)
            .await
        } else {
            sqlx::query_as::<_, Event>(&format!(
                r#"
                SELECT {EVENT_COLUMNS} FROM events
                WHERE starts_at > ? AND is_cancelled = FALSE
                ORDER BY starts_at ASC
                LIMIT ?
                "#,
            ))
            .bind(now)
            .bind(limit)
            .fetch_all(pool)
            .await
        }
        .map_err(AppError::Database)?;

        Ok(rows)
    }

    /// Flip the cancelled flag. Returns `None` when the event does not
    /// exist; re-running on an already cancelled event is a no-op.
    pub async fn cancel(pool: &SqlitePool, id: i64) -> AppResult<Option<Event>> {
        let row = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events SET is_cancelled = TRUE
            WHERE id = ?
            RETURNING {EVENT_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Admin view of all events, newest start first.
    pub async fn list_all(pool: &SqlitePool, include_cancelled: bool) -> AppResult<Vec<Event>> {
        let rows = if include_cancelled {
            sqlx::query_as::<_, Event>(&format!(
                "SELECT {EVENT_COLUMNS} FROM events ORDER BY starts_at DESC"
            ))
            .fetch_all(pool)
            .await
        } else {
            sqlx::query_as::<_, Event>(&format!(
                "SELECT {EVENT_COLUMNS} FROM events WHERE is_cancelled = FALSE ORDER BY starts_at DESC"
            ))
            .fetch_all(pool)
            .await
        }
        .map_err(AppError::Database)?;

        Ok(rows)
    }
}

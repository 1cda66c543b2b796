use chrono::NaiveDateTime;
use sqlx::SqlitePool;

use crate::db::models::{DueReminder, ReminderType, ScheduledReminder};
use crate::error::{AppError, AppResult};

pub struct ReminderRepository;

impl ReminderRepository {
    /// Derive and persist the reminders for a fresh registration: one row
    /// per fixed offset (24 hours and 15 minutes before start) whose fire
    /// time is still strictly in the future. Offsets already in the past are
    /// skipped silently, so registering shortly before an event simply
    /// yields fewer rows. Returns the rows actually created.
    pub async fn create_for_registration(
        pool: &SqlitePool,
        registration_id: i64,
        starts_at: NaiveDateTime,
        now: NaiveDateTime,
    ) -> AppResult<Vec<ScheduledReminder>> {
        let mut created = Vec::new();

        for reminder_type in ReminderType::ALL {
            let remind_at = reminder_type.fire_time(starts_at);
            if remind_at <= now {
                continue;
            }

            let row = sqlx::query_as::<_, ScheduledReminder>(
                r#"
                INSERT INTO scheduled_reminders (registration_id, remind_at, reminder_type)
                VALUES (?, ?, ?)
                RETURNING id, registration_id, remind_at, reminder_type, sent, attempts
                "#,
            )
            .bind(registration_id)
            .bind(remind_at)
            .bind(reminder_type)
            .fetch_one(pool)
            .await
            .map_err(AppError::Database)?;

            created.push(row);
        }

        Ok(created)
    }

    /// Every reminder that is due and still deliverable: fire time reached,
    /// not yet sent, owning registration active, owning event not cancelled.
    /// Joined with the columns the dispatcher needs, oldest due first.
    pub async fn due_unsent(pool: &SqlitePool, now: NaiveDateTime) -> AppResult<Vec<DueReminder>> {
        let rows = sqlx::query_as::<_, DueReminder>(
            r#"
            SELECT sr.id, sr.registration_id, sr.remind_at, sr.reminder_type, sr.attempts,
                   r.user_id, r.event_id,
                   e.title, e.location, e.starts_at,
                   u.first_name
            FROM scheduled_reminders sr
            JOIN registrations r ON sr.registration_id = r.id
            JOIN events e ON r.event_id = e.id
            JOIN users u ON r.user_id = u.id
            WHERE sr.remind_at <= ?
              AND sr.sent = FALSE
              AND r.status = 'active'
              AND e.is_cancelled = FALSE
            ORDER BY sr.remind_at
            "#,
        )
        .bind(now)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }

    /// Terminal transition after a delivered or permanently failed send.
    pub async fn mark_sent(pool: &SqlitePool, id: i64) -> AppResult<()> {
        sqlx::query("UPDATE scheduled_reminders SET sent = TRUE WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    /// Record a transient delivery failure. Once the attempt count reaches
    /// `max_attempts` the reminder is marked sent without delivery, so a
    /// persistently failing channel cannot retry forever. Returns the
    /// updated row.
    pub async fn register_failed_attempt(
        pool: &SqlitePool,
        id: i64,
        max_attempts: u32,
    ) -> AppResult<ScheduledReminder> {
        let row = sqlx::query_as::<_, ScheduledReminder>(
            r#"
            UPDATE scheduled_reminders
            SET attempts = attempts + 1,
                sent = CASE WHEN attempts + 1 >= ? THEN TRUE ELSE sent END
            WHERE id = ?
            RETURNING id, registration_id, remind_at, reminder_type, sent, attempts
            "#,
        )
        .bind(max_attempts as i64)
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Cascade for a per-user cancellation: unsent reminders disappear, sent
    /// rows stay as history. Idempotent. Returns the number of rows removed.
    pub async fn delete_unsent_for_registration(
        pool: &SqlitePool,
        registration_id: i64,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM scheduled_reminders WHERE registration_id = ? AND sent = FALSE",
        )
        .bind(registration_id)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }

    /// Cascade for an event-level cancellation: every unsent reminder of
    /// every registration of the event is flipped to sent, suppressing
    /// future delivery without deleting audit history. Idempotent.
    pub async fn mark_all_sent_for_event(pool: &SqlitePool, event_id: i64) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE scheduled_reminders SET sent = TRUE
            WHERE registration_id IN (
                SELECT id FROM registrations WHERE event_id = ?
            ) AND sent = FALSE
            "#,
        )
        .bind(event_id)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }
}

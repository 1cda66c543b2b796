use sqlx::SqlitePool;

use crate::db::models::{EventParticipant, Registration, UserRegistration};
use crate::error::{AppError, AppResult};

pub struct RegistrationRepository;

impl RegistrationRepository {
    /// Create a registration, or reactivate the existing row for the same
    /// (user, event) pair. The UNIQUE constraint guarantees at most one row
    /// per pair; the conflict clause handles re-registering after a
    /// cancellation in a single atomic statement.
    pub async fn upsert_active(
        pool: &SqlitePool,
        user_id: i64,
        event_id: i64,
    ) -> AppResult<Registration> {
        let row = sqlx::query_as::<_, Registration>(
            r#"
            INSERT INTO registrations (user_id, event_id, status)
            VALUES (?, ?, 'active')
            ON CONFLICT (user_id, event_id) DO UPDATE SET status = 'active'
            RETURNING id, user_id, event_id, status, created_at
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Set the registration's status to cancelled. Returns `None` when no
    /// row exists for the pair; re-cancelling is a no-op.
    pub async fn cancel(
        pool: &SqlitePool,
        user_id: i64,
        event_id: i64,
    ) -> AppResult<Option<Registration>> {
        let row = sqlx::query_as::<_, Registration>(
            r#"
            UPDATE registrations SET status = 'cancelled'
            WHERE user_id = ? AND event_id = ?
            RETURNING id, user_id, event_id, status, created_at
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn find(
        pool: &SqlitePool,
        user_id: i64,
        event_id: i64,
    ) -> AppResult<Option<Registration>> {
        let row = sqlx::query_as::<_, Registration>(
            r#"
            SELECT id, user_id, event_id, status, created_at
            FROM registrations
            WHERE user_id = ? AND event_id = ?
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Participants of an event with their profile info, in registration
    /// order. `active_only = false` includes cancelled rows for audit/export.
    pub async fn list_for_event(
        pool: &SqlitePool,
        event_id: i64,
        active_only: bool,
    ) -> AppResult<Vec<EventParticipant>> {
        let rows = if active_only {
            sqlx::query_as::<_, EventParticipant>(
                r#"
                SELECT r.id, r.user_id, r.event_id, r.status, r.created_at,
                       u.first_name, u.username
                FROM registrations r
                JOIN users u ON r.user_id = u.id
                WHERE r.event_id = ? AND r.status = 'active'
                ORDER BY r.created_at
                "#,
            )
            .bind(event_id)
            .fetch_all(pool)
            .await
        } else {
            sqlx::query_as::<_, EventParticipant>(
                r#"
                SELECT r.id, r.user_id, r.event_id, r.status, r.created_at,
                       u.first_name, u.username
                FROM registrations r
                JOIN users u ON r.user_id = u.id
                WHERE r.event_id = ?
                ORDER BY r.created_at
                "#,
            )
            .bind(event_id)
            .fetch_all(pool)
            .await
        }
        .map_err(AppError::Database)?;

        Ok(rows)
    }

    /// A user's registrations with event details, soonest event first. The
    /// active-only view also hides cancelled events.
    pub async fn list_for_user(
        pool: &SqlitePool,
        user_id: i64,
        active_only: bool,
    ) -> AppResult<Vec<UserRegistration>> {
        let rows = if active_only {
            sqlx::query_as::<_, UserRegistration>(
                r#"
                SELECT r.id, r.event_id, r.status,
                       e.title, e.category, e.format, e.starts_at, e.location
                FROM registrations r
                JOIN events e ON r.event_id = e.id
                WHERE r.user_id = ? AND r.status = 'active' AND e.is_cancelled = FALSE
                ORDER BY e.starts_at
                "#,
            )
            .bind(user_id)
            .fetch_all(pool)
            .await
        } else {
            sqlx::query_as::<_, UserRegistration>(
                r#"
                SELECT r.id, r.event_id, r.status,
                       e.title, e.category, e.format, e.starts_at, e.location
                FROM registrations r
                JOIN events e ON r.event_id = e.id
                WHERE r.user_id = ?
                ORDER BY e.starts_at
                "#,
            )
            .bind(user_id)
            .fetch_all(pool)
            .await
        }
        .map_err(AppError::Database)?;

        Ok(rows)
    }

    /// Number of active registrations for an event.
    pub async fn count_active(pool: &SqlitePool, event_id: i64) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM registrations WHERE event_id = ? AND status = 'active'",
        )
        .bind(event_id)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(count)
    }
}

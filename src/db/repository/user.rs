use sqlx::SqlitePool;

use crate::db::models::{EventCategory, NotifyPrefsUpdate, UpsertUser, User};
use crate::error::{AppError, AppResult};

pub struct UserRepository;

impl UserRepository {
    /// Create a user or refresh the display name and handle of an existing
    /// one. Idempotent: safe to call on every interaction. Notification
    /// flags are never touched here.
    pub async fn upsert(pool: &SqlitePool, id: i64, user: UpsertUser) -> AppResult<User> {
        let row = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, first_name, username)
            VALUES (?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                first_name = excluded.first_name,
                username = excluded.username
            RETURNING id, first_name, username, notify_it, notify_sport, notify_books, created_at
            "#,
        )
        .bind(id)
        .bind(user.first_name)
        .bind(user.username)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, username, notify_it, notify_sport, notify_books, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Apply a partial notification-flag update in one statement. Absent
    /// fields keep their stored value via COALESCE. Returns `None` when the
    /// user does not exist.
    pub async fn update_notify_prefs(
        pool: &SqlitePool,
        id: i64,
        prefs: NotifyPrefsUpdate,
    ) -> AppResult<Option<User>> {
        if prefs.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let row = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                notify_it = COALESCE(?, notify_it),
                notify_sport = COALESCE(?, notify_sport),
                notify_books = COALESCE(?, notify_books)
            WHERE id = ?
            RETURNING id, first_name, username, notify_it, notify_sport, notify_books, created_at
            "#,
        )
        .bind(prefs.notify_it)
        .bind(prefs.notify_sport)
        .bind(prefs.notify_books)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Users whose notification flag for the given category is on, used for
    /// new-event announcements.
    pub async fn list_by_category(
        pool: &SqlitePool,
        category: EventCategory,
    ) -> AppResult<Vec<User>> {
        let query = match category {
            EventCategory::It => {
                "SELECT id, first_name, username, notify_it, notify_sport, notify_books, created_at \
                 FROM users WHERE notify_it = TRUE"
            }
            EventCategory::Sport => {
                "SELECT id, first_name, username, notify_it, notify_sport, notify_books, created_at \
                 FROM users WHERE notify_sport = TRUE"
            }
            EventCategory::Books => {
                "SELECT id, first_name, username, notify_it, notify_sport, notify_books, created_at \
                 FROM users WHERE notify_books = TRUE"
            }
        };

        let rows = sqlx::query_as::<_, User>(query)
            .fetch_all(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(rows)
    }
}

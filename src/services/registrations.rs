use chrono::NaiveDateTime;
use sqlx::SqlitePool;

use crate::db::models::Registration;
use crate::db::repository::{
    EventRepository, RegistrationRepository, ReminderRepository, UserRepository,
};
use crate::error::{AppError, AppResult};

/// Result of a sign-up attempt. `reminders_created` is zero both when the
/// user was already signed up and when every reminder offset is in the past.
#[derive(Debug)]
pub struct SignupOutcome {
    pub registration: Registration,
    pub already_registered: bool,
    pub reminders_created: usize,
}

pub struct RegistrationService;

impl RegistrationService {
    /// Sign a user up for an event and schedule their reminders.
    ///
    /// Re-registering while already active returns the existing row without
    /// touching reminders, so repeated taps cannot duplicate them. Signing up
    /// again after a cancellation reactivates the row and derives a fresh
    /// reminder set.
    pub async fn register(
        pool: &SqlitePool,
        user_id: i64,
        event_id: i64,
        now: NaiveDateTime,
    ) -> AppResult<SignupOutcome> {
        if UserRepository::find_by_id(pool, user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        let event = EventRepository::find_by_id(pool, event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", event_id)))?;

        if event.is_cancelled {
            return Err(AppError::BadRequest("Мероприятие отменено".to_string()));
        }
        if event.starts_at <= now {
            return Err(AppError::BadRequest(
                "Мероприятие уже началось".to_string(),
            ));
        }

        if let Some(existing) = RegistrationRepository::find(pool, user_id, event_id).await? {
            if existing.is_active() {
                return Ok(SignupOutcome {
                    registration: existing,
                    already_registered: true,
                    reminders_created: 0,
                });
            }
        }

        let registration = RegistrationRepository::upsert_active(pool, user_id, event_id).await?;
        let reminders = ReminderRepository::create_for_registration(
            pool,
            registration.id,
            event.starts_at,
            now,
        )
        .await?;

        tracing::info!(
            "User {} registered for event {} ({} reminders scheduled)",
            user_id,
            event_id,
            reminders.len()
        );

        Ok(SignupOutcome {
            registration,
            already_registered: false,
            reminders_created: reminders.len(),
        })
    }

    /// Cancel a user's registration and drop its pending reminders. Already
    /// delivered reminders stay as history.
    pub async fn cancel(
        pool: &SqlitePool,
        user_id: i64,
        event_id: i64,
    ) -> AppResult<Registration> {
        let existing = RegistrationRepository::find(pool, user_id, event_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No registration for user {} and event {}",
                    user_id, event_id
                ))
            })?;

        // Reminders go first so a crash between the two steps can never leave
        // a cancelled registration with reminders still pending.
        let removed =
            ReminderRepository::delete_unsent_for_registration(pool, existing.id).await?;
        let registration = RegistrationRepository::cancel(pool, user_id, event_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No registration for user {} and event {}",
                    user_id, event_id
                ))
            })?;
        tracing::info!(
            "User {} cancelled registration for event {} ({} reminders dropped)",
            user_id,
            event_id,
            removed
        );

        Ok(registration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::UpsertUser;
    use crate::db::repository::event::tests::sample_event;
    use crate::db::test_pool;
    use chrono::{Duration, Utc};

    async fn seed_user(pool: &SqlitePool, id: i64) {
        UserRepository::upsert(
            pool,
            id,
            UpsertUser {
                first_name: "Анна".to_string(),
                username: Some("anna".to_string()),
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn register_creates_reminders_once() {
        let pool = test_pool().await;
        let now = Utc::now().naive_utc();
        seed_user(&pool, 1).await;
        let event = EventRepository::create(&pool, &sample_event("Митап", now + Duration::days(2)))
            .await
            .unwrap();

        let first = RegistrationService::register(&pool, 1, event.id, now)
            .await
            .unwrap();
        assert!(!first.already_registered);
        assert_eq!(first.reminders_created, 2);

        // A second tap neither errors nor duplicates reminders.
        let second = RegistrationService::register(&pool, 1, event.id, now)
            .await
            .unwrap();
        assert!(second.already_registered);
        assert_eq!(second.reminders_created, 0);
        assert_eq!(second.registration.id, first.registration.id);

        let reminder_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scheduled_reminders")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(reminder_rows, 2);
    }

    #[tokio::test]
    async fn register_rejects_cancelled_and_started_events() {
        let pool = test_pool().await;
        let now = Utc::now().naive_utc();
        seed_user(&pool, 1).await;

        let cancelled =
            EventRepository::create(&pool, &sample_event("Снятое", now + Duration::days(1)))
                .await
                .unwrap();
        EventRepository::cancel(&pool, cancelled.id).await.unwrap();
        assert!(matches!(
            RegistrationService::register(&pool, 1, cancelled.id, now).await,
            Err(AppError::BadRequest(_))
        ));

        let started =
            EventRepository::create(&pool, &sample_event("Идущее", now - Duration::hours(1)))
                .await
                .unwrap();
        assert!(matches!(
            RegistrationService::register(&pool, 1, started.id, now).await,
            Err(AppError::BadRequest(_))
        ));

        assert!(matches!(
            RegistrationService::register(&pool, 1, 9999, now).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            RegistrationService::register(&pool, 42, cancelled.id, now).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn cancel_drops_pending_reminders_and_reregistering_restores_them() {
        let pool = test_pool().await;
        let now = Utc::now().naive_utc();
        seed_user(&pool, 1).await;
        let event = EventRepository::create(&pool, &sample_event("Митап", now + Duration::days(2)))
            .await
            .unwrap();

        RegistrationService::register(&pool, 1, event.id, now)
            .await
            .unwrap();
        RegistrationService::cancel(&pool, 1, event.id).await.unwrap();

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scheduled_reminders")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);

        // Signing up again derives a fresh set.
        let again = RegistrationService::register(&pool, 1, event.id, now)
            .await
            .unwrap();
        assert!(!again.already_registered);
        assert_eq!(again.reminders_created, 2);

        assert!(matches!(
            RegistrationService::cancel(&pool, 2, event.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}

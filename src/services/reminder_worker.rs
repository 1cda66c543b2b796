use std::sync::Arc;

use chrono::NaiveDateTime;
use sqlx::SqlitePool;

use crate::db::models::{DueReminder, ReminderType};
use crate::db::repository::ReminderRepository;
use crate::error::AppResult;
use crate::services::dispatch::DeliveryReport;
use crate::services::messages;
use crate::services::notifier::{DeliveryOutcome, Notifier, OutgoingMessage};

/// Polls for due reminders and pushes them through the notifier.
///
/// Each reminder transitions exactly once: a delivered or unreachable send
/// marks it sent, a transient failure leaves it unsent for the next pass
/// (until the attempt cap abandons it). Running a pass twice at the same
/// instant delivers nothing twice.
pub struct ReminderWorker {
    pool: SqlitePool,
    notifier: Arc<dyn Notifier>,
    max_attempts: u32,
}

impl ReminderWorker {
    pub fn new(pool: SqlitePool, notifier: Arc<dyn Notifier>, max_attempts: u32) -> Self {
        Self {
            pool,
            notifier,
            max_attempts,
        }
    }

    fn render(reminder: &DueReminder) -> OutgoingMessage {
        match reminder.reminder_type {
            ReminderType::DayBefore => OutgoingMessage::with_attendance_prompt(
                messages::day_before_reminder(reminder),
                reminder.registration_id,
            ),
            ReminderType::SoonBefore => {
                OutgoingMessage::plain(messages::soon_reminder(reminder))
            }
        }
    }

    /// One polling pass at the given instant. A database error on one
    /// reminder is logged and the pass continues with the rest.
    pub async fn run_once(&self, now: NaiveDateTime) -> AppResult<DeliveryReport> {
        let due = ReminderRepository::due_unsent(&self.pool, now).await?;
        if due.is_empty() {
            return Ok(DeliveryReport::default());
        }

        tracing::debug!("Processing {} due reminders", due.len());
        let mut report = DeliveryReport::default();

        for reminder in due {
            let message = Self::render(&reminder);
            let outcome = self.notifier.notify(reminder.user_id, &message).await;
            report.record(outcome);

            let transition = match outcome {
                DeliveryOutcome::Delivered => {
                    ReminderRepository::mark_sent(&self.pool, reminder.id).await
                }
                DeliveryOutcome::Unreachable => {
                    // The recipient is gone for good; retrying cannot help.
                    ReminderRepository::mark_sent(&self.pool, reminder.id).await
                }
                DeliveryOutcome::Failed => {
                    ReminderRepository::register_failed_attempt(
                        &self.pool,
                        reminder.id,
                        self.max_attempts,
                    )
                    .await
                    .map(|updated| {
                        if updated.sent {
                            tracing::warn!(
                                "Reminder {} abandoned after {} failed attempts",
                                updated.id,
                                updated.attempts
                            );
                        }
                    })
                }
            };

            if let Err(e) = transition {
                tracing::error!(
                    "Failed to record outcome for reminder {}: {}",
                    reminder.id,
                    e
                );
            }
        }

        tracing::info!(
            "Reminder pass complete: delivered={} unreachable={} failed={}",
            report.delivered,
            report.unreachable,
            report.failed
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::UpsertUser;
    use crate::db::repository::event::tests::sample_event;
    use crate::db::repository::{EventRepository, UserRepository};
    use crate::db::test_pool;
    use crate::services::notifier::testing::FakeNotifier;
    use crate::services::registrations::RegistrationService;
    use chrono::{Duration, Utc};

    async fn seed_signup(
        pool: &SqlitePool,
        user_id: i64,
        starts_at: NaiveDateTime,
        now: NaiveDateTime,
    ) -> i64 {
        UserRepository::upsert(
            pool,
            user_id,
            UpsertUser {
                first_name: "Анна".to_string(),
                username: None,
            },
        )
        .await
        .unwrap();
        let event = EventRepository::create(pool, &sample_event("Митап", starts_at))
            .await
            .unwrap();
        RegistrationService::register(pool, user_id, event.id, now)
            .await
            .unwrap();
        event.id
    }

    fn worker(pool: &SqlitePool, notifier: Arc<FakeNotifier>) -> ReminderWorker {
        ReminderWorker::new(pool.clone(), notifier, 3)
    }

    #[tokio::test]
    async fn pass_is_idempotent() {
        let pool = test_pool().await;
        let now = Utc::now().naive_utc();
        let notifier = Arc::new(FakeNotifier::new());
        seed_signup(&pool, 1, now + Duration::hours(25), now).await;
        let worker = worker(&pool, notifier.clone());

        // Before any fire time nothing happens.
        let report = worker.run_once(now).await.unwrap();
        assert_eq!(report.total(), 0);

        // Past the 24h fire time the reminder goes out exactly once.
        let later = now + Duration::hours(2);
        let report = worker.run_once(later).await.unwrap();
        assert_eq!(report.delivered, 1);

        let report = worker.run_once(later).await.unwrap();
        assert_eq!(report.total(), 0);
        assert_eq!(notifier.sent_count(), 1);
    }

    #[tokio::test]
    async fn day_before_carries_attendance_prompt() {
        let pool = test_pool().await;
        let now = Utc::now().naive_utc();
        let notifier = Arc::new(FakeNotifier::new());
        seed_signup(&pool, 1, now + Duration::hours(25), now).await;
        let worker = worker(&pool, notifier.clone());

        worker.run_once(now + Duration::hours(2)).await.unwrap();
        {
            let sent = notifier.sent.lock().unwrap();
            assert!(sent[0].1.attendance_prompt.is_some());
            assert!(sent[0].1.text.contains("планируете посетить"));
        }

        // The 15-minute reminder is informational, no prompt.
        worker
            .run_once(now + Duration::hours(25))
            .await
            .unwrap();
        let sent = notifier.sent.lock().unwrap();
        assert!(sent[1].1.attendance_prompt.is_none());
        assert!(sent[1].1.text.contains("через 15 минут"));
    }

    #[tokio::test]
    async fn unreachable_recipient_is_terminal() {
        let pool = test_pool().await;
        let now = Utc::now().naive_utc();
        let notifier = Arc::new(FakeNotifier::new());
        seed_signup(&pool, 1, now + Duration::hours(25), now).await;
        let worker = worker(&pool, notifier.clone());

        notifier.push_outcome(DeliveryOutcome::Unreachable);
        let later = now + Duration::hours(2);
        let report = worker.run_once(later).await.unwrap();
        assert_eq!(report.unreachable, 1);

        // No retry on the next pass.
        let report = worker.run_once(later).await.unwrap();
        assert_eq!(report.total(), 0);
    }

    #[tokio::test]
    async fn transient_failures_retry_until_cap() {
        let pool = test_pool().await;
        let now = Utc::now().naive_utc();
        let notifier = Arc::new(FakeNotifier::new());
        seed_signup(&pool, 1, now + Duration::hours(25), now).await;
        let worker = worker(&pool, notifier.clone());

        let later = now + Duration::hours(2);
        for _ in 0..3 {
            notifier.push_outcome(DeliveryOutcome::Failed);
            let report = worker.run_once(later).await.unwrap();
            assert_eq!(report.failed, 1);
        }

        // The cap (3) was reached, the reminder is abandoned.
        let report = worker.run_once(later).await.unwrap();
        assert_eq!(report.total(), 0);
        assert_eq!(notifier.sent_count(), 3);
    }

    #[tokio::test]
    async fn full_lifecycle_with_advancing_clock() {
        let pool = test_pool().await;
        let now = Utc::now().naive_utc();
        let notifier = Arc::new(FakeNotifier::new());
        let starts_at = now + Duration::hours(30);
        let event_id = seed_signup(&pool, 1, starts_at, now).await;

        // A second attendee who cancels before anything fires.
        UserRepository::upsert(
            &pool,
            2,
            UpsertUser {
                first_name: "Борис".to_string(),
                username: None,
            },
        )
        .await
        .unwrap();
        RegistrationService::register(&pool, 2, event_id, now)
            .await
            .unwrap();
        RegistrationService::cancel(&pool, 2, event_id).await.unwrap();

        let worker = worker(&pool, notifier.clone());

        // Just past start-24h: only the active attendee is reminded.
        let at_day_before = starts_at - Duration::hours(24) + Duration::minutes(1);
        let report = worker.run_once(at_day_before).await.unwrap();
        assert_eq!(report.delivered, 1);

        // Between the offsets nothing is due.
        let between = starts_at - Duration::hours(12);
        assert_eq!(worker.run_once(between).await.unwrap().total(), 0);

        // Just past start-15min: the second reminder fires.
        let at_soon = starts_at - Duration::minutes(14);
        let report = worker.run_once(at_soon).await.unwrap();
        assert_eq!(report.delivered, 1);

        // After the event nothing remains.
        assert_eq!(
            worker
                .run_once(starts_at + Duration::hours(1))
                .await
                .unwrap()
                .total(),
            0
        );
        assert_eq!(notifier.sent_count(), 2);
    }
}

use chrono::NaiveDateTime;
use sqlx::SqlitePool;

use crate::db::models::{Event, NewEvent};
use crate::db::repository::{
    EventRepository, RegistrationRepository, ReminderRepository, UserRepository,
};
use crate::error::{AppError, AppResult};
use crate::services::dispatch::{self, DeliveryReport};
use crate::services::messages;
use crate::services::notifier::{Notifier, OutgoingMessage};

const MIN_TITLE_LEN: usize = 3;
const MIN_BROADCAST_LEN: usize = 3;

pub struct EventService;

impl EventService {
    /// Create an event and announce it to every user subscribed to its
    /// category. `published_by` (the operator's own chat) is excluded from
    /// the announcement.
    pub async fn publish(
        pool: &SqlitePool,
        notifier: &dyn Notifier,
        event: NewEvent,
        published_by: Option<i64>,
        now: NaiveDateTime,
    ) -> AppResult<(Event, DeliveryReport)> {
        if event.title.trim().chars().count() < MIN_TITLE_LEN {
            return Err(AppError::Validation(
                "Название должно быть не короче 3 символов".to_string(),
            ));
        }
        if event.starts_at <= now {
            return Err(AppError::Validation(
                "Дата начала должна быть в будущем".to_string(),
            ));
        }

        let event = EventRepository::create(pool, &event).await?;

        let subscribers = UserRepository::list_by_category(pool, event.category).await?;
        let recipients = subscribers
            .into_iter()
            .map(|u| u.id)
            .filter(|id| Some(*id) != published_by);

        let message = OutgoingMessage::plain(messages::new_event_announcement(&event));
        let report = dispatch::broadcast(notifier, recipients, &message).await;

        tracing::info!(
            "Event {} published; announcement delivered={} unreachable={} failed={}",
            event.id,
            report.delivered,
            report.unreachable,
            report.failed
        );

        Ok((event, report))
    }

    /// Cancel an event and run the full cascade: pending reminders are
    /// suppressed first, so the delivery loop cannot fire one mid-cancel,
    /// then the flag is flipped and active registrants are notified.
    pub async fn cancel(
        pool: &SqlitePool,
        notifier: &dyn Notifier,
        event_id: i64,
    ) -> AppResult<(Event, DeliveryReport)> {
        let event = EventRepository::find_by_id(pool, event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", event_id)))?;
        if event.is_cancelled {
            return Err(AppError::BadRequest(
                "Мероприятие уже отменено".to_string(),
            ));
        }

        // Snapshot the recipients before the flag flips: afterwards their
        // registrations no longer count as attending a live event.
        let participants = RegistrationRepository::list_for_event(pool, event_id, true).await?;

        let suppressed = ReminderRepository::mark_all_sent_for_event(pool, event_id).await?;
        let event = EventRepository::cancel(pool, event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", event_id)))?;

        let message = OutgoingMessage::plain(messages::cancellation_notice(&event.title));
        let recipients: Vec<i64> = participants.iter().map(|p| p.user_id).collect();
        let report = dispatch::broadcast(notifier, recipients, &message).await;

        tracing::info!(
            "Event {} cancelled; {} reminders suppressed, notice delivered={} unreachable={} failed={}",
            event_id,
            suppressed,
            report.delivered,
            report.unreachable,
            report.failed
        );

        Ok((event, report))
    }

    /// Organizer free-text message to an event's active registrants.
    pub async fn broadcast_to_participants(
        pool: &SqlitePool,
        notifier: &dyn Notifier,
        event_id: i64,
        text: &str,
    ) -> AppResult<DeliveryReport> {
        let text = text.trim();
        if text.chars().count() < MIN_BROADCAST_LEN {
            return Err(AppError::Validation(
                "Сообщение должно быть не короче 3 символов".to_string(),
            ));
        }

        let event = EventRepository::find_by_id(pool, event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", event_id)))?;

        let participants = RegistrationRepository::list_for_event(pool, event_id, true).await?;
        let message = OutgoingMessage::plain(messages::organizer_broadcast(&event.title, text));
        let recipients: Vec<i64> = participants.iter().map(|p| p.user_id).collect();
        let report = dispatch::broadcast(notifier, recipients, &message).await;

        tracing::info!(
            "Broadcast for event {}: delivered={} unreachable={} failed={}",
            event_id,
            report.delivered,
            report.unreachable,
            report.failed
        );

        Ok(report)
    }
}

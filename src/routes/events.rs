use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::models::{Event, EventCategory, EventParticipant, NewEvent};
use crate::db::repository::{EventRepository, RegistrationRepository};
use crate::error::{AppError, AppResult};
use crate::services::calendar;
use crate::services::dispatch::DeliveryReport;
use crate::services::events::EventService;
use crate::AppState;

/// Router for event endpoints. Mutating and participant-listing routes
/// require the admin bearer token; discovery routes are open.
pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let admin = Router::new()
        .route("/", post(create_event).get(list_all))
        .route("/:id/cancel", post(cancel_event))
        .route("/:id/broadcast", post(broadcast))
        .route("/:id/participants", get(list_participants))
        .route("/:id/participants.csv", get(export_participants_csv))
        .layer(axum::middleware::from_fn_with_state(
            state,
            crate::middleware::auth::require_admin,
        ));

    Router::new()
        .route("/upcoming", get(list_upcoming))
        .route("/:id", get(get_event))
        .route("/:id/calendar-links", get(calendar_links))
        .merge(admin)
}

#[derive(Debug, Deserialize)]
struct CreateEventRequest {
    #[serde(flatten)]
    event: NewEvent,
    /// Operator's own chat id, excluded from the announcement.
    published_by: Option<i64>,
}

#[derive(Debug, Serialize)]
struct PublishResponse {
    event: Event,
    announcement: DeliveryReport,
}

async fn create_event(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateEventRequest>,
) -> AppResult<Response> {
    let now = chrono::Utc::now().naive_utc();
    let (event, announcement) = EventService::publish(
        &state.db,
        state.notifier.as_ref(),
        payload.event,
        payload.published_by,
        now,
    )
    .await?;

    let body = Json(PublishResponse {
        event,
        announcement,
    });
    Ok((StatusCode::CREATED, body).into_response())
}

#[derive(Debug, Deserialize)]
struct ListAllQuery {
    #[serde(default)]
    include_cancelled: bool,
}

async fn list_all(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListAllQuery>,
) -> AppResult<Json<Vec<Event>>> {
    let events = EventRepository::list_all(&state.db, query.include_cancelled).await?;
    Ok(Json(events))
}

#[derive(Debug, Deserialize)]
struct UpcomingQuery {
    category: Option<EventCategory>,
    limit: Option<u32>,
}

async fn list_upcoming(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UpcomingQuery>,
) -> AppResult<Json<Vec<Event>>> {
    let limit = query.limit.unwrap_or(20).min(100) as i64;
    let now = chrono::Utc::now().naive_utc();
    let events = EventRepository::list_upcoming(&state.db, query.category, limit, now).await?;
    Ok(Json(events))
}

async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<Event>> {
    let event = EventRepository::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))?;
    Ok(Json(event))
}

#[derive(Debug, Serialize)]
struct CalendarLinks {
    google: String,
    yandex: String,
}

async fn calendar_links(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<CalendarLinks>> {
    let event = EventRepository::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))?;

    Ok(Json(CalendarLinks {
        google: calendar::google_calendar_url(&event),
        yandex: calendar::yandex_calendar_url(&event),
    }))
}

#[derive(Debug, Serialize)]
struct CancelResponse {
    event: Event,
    notifications: DeliveryReport,
}

async fn cancel_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<CancelResponse>> {
    let (event, notifications) =
        EventService::cancel(&state.db, state.notifier.as_ref(), id).await?;
    Ok(Json(CancelResponse {
        event,
        notifications,
    }))
}

#[derive(Debug, Deserialize)]
struct BroadcastRequest {
    text: String,
}

async fn broadcast(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<BroadcastRequest>,
) -> AppResult<Json<DeliveryReport>> {
    let report = EventService::broadcast_to_participants(
        &state.db,
        state.notifier.as_ref(),
        id,
        &payload.text,
    )
    .await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
struct ParticipantsQuery {
    /// Include cancelled registrations for audit.
    #[serde(default)]
    all: bool,
}

async fn list_participants(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<ParticipantsQuery>,
) -> AppResult<Json<Vec<EventParticipant>>> {
    require_event(&state, id).await?;
    let rows = RegistrationRepository::list_for_event(&state.db, id, !query.all).await?;
    Ok(Json(rows))
}

async fn export_participants_csv(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<ParticipantsQuery>,
) -> AppResult<Response> {
    let event = require_event(&state, id).await?;
    let rows = RegistrationRepository::list_for_event(&state.db, id, !query.all).await?;

    let csv = participants_csv(&rows);
    let filename = format!("attachment; filename=\"participants-{}.csv\"", event.id);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        csv,
    )
        .into_response())
}

async fn require_event(state: &AppState, id: i64) -> AppResult<Event> {
    EventRepository::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Leading BOM keeps Cyrillic readable when the file is opened in Excel.
fn participants_csv(rows: &[EventParticipant]) -> String {
    let mut out = String::from("\u{feff}user_id,first_name,username,status,registered_at\n");
    for row in rows {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            row.user_id,
            csv_field(&row.first_name),
            csv_field(row.username.as_deref().unwrap_or("")),
            row.status.as_str(),
            row.created_at.format("%Y-%m-%d %H:%M:%S"),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::RegistrationStatus;
    use chrono::NaiveDate;

    #[test]
    fn csv_escapes_separators_and_quotes() {
        let rows = vec![EventParticipant {
            id: 1,
            user_id: 42,
            event_id: 7,
            status: RegistrationStatus::Active,
            created_at: NaiveDate::from_ymd_opt(2025, 1, 20)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
            first_name: "Анна, \"Нюра\"".to_string(),
            username: None,
        }];

        let csv = participants_csv(&rows);
        assert!(csv.starts_with('\u{feff}'));
        assert!(csv.contains("\"Анна, \"\"Нюра\"\"\""));
        assert!(csv.contains("42,"));
        assert!(csv.contains("2025-01-20 10:30:00"));
    }
}

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::models::Registration;
use crate::error::AppResult;
use crate::services::registrations::RegistrationService;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(register))
        .route("/cancel", post(cancel))
}

#[derive(Debug, Deserialize)]
struct RegistrationRequest {
    user_id: i64,
    event_id: i64,
}

#[derive(Debug, Serialize)]
struct SignupResponse {
    registration: Registration,
    already_registered: bool,
    reminders_created: usize,
}

/// Sign a user up for an event. Repeating the call for an active
/// registration returns 200 with the existing row instead of 201.
async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegistrationRequest>,
) -> AppResult<Response> {
    let now = chrono::Utc::now().naive_utc();
    let outcome =
        RegistrationService::register(&state.db, payload.user_id, payload.event_id, now).await?;

    let status = if outcome.already_registered {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    let body = Json(SignupResponse {
        registration: outcome.registration,
        already_registered: outcome.already_registered,
        reminders_created: outcome.reminders_created,
    });

    Ok((status, body).into_response())
}

async fn cancel(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegistrationRequest>,
) -> AppResult<Json<Registration>> {
    let registration =
        RegistrationService::cancel(&state.db, payload.user_id, payload.event_id).await?;
    Ok(Json(registration))
}

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use crate::db::models::{NotifyPrefsUpdate, UpsertUser, User, UserRegistration};
use crate::db::repository::{RegistrationRepository, UserRepository};
use crate::error::{AppError, AppResult};
use crate::AppState;

/// Router for user profile and preference endpoints.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:id", put(upsert_user).get(get_user))
        .route("/:id/notifications", axum::routing::patch(update_notifications))
        .route("/:id/registrations", get(list_registrations))
}

/// Create or refresh a user profile. Called on every interaction, so the
/// handler is idempotent.
async fn upsert_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<UpsertUser>,
) -> AppResult<Json<User>> {
    if payload.first_name.trim().is_empty() {
        return Err(AppError::Validation("Имя не может быть пустым".to_string()));
    }

    let user = UserRepository::upsert(&state.db, id, payload).await?;
    Ok(Json(user))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<User>> {
    let user = UserRepository::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
    Ok(Json(user))
}

/// Partial update of per-category announcement flags.
async fn update_notifications(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<NotifyPrefsUpdate>,
) -> AppResult<Json<User>> {
    let user = UserRepository::update_notify_prefs(&state.db, id, payload)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
struct RegistrationsQuery {
    /// Include cancelled registrations and cancelled events.
    #[serde(default)]
    all: bool,
}

async fn list_registrations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<RegistrationsQuery>,
) -> AppResult<Json<Vec<UserRegistration>>> {
    if UserRepository::find_by_id(&state.db, id).await?.is_none() {
        return Err(AppError::NotFound(format!("User {} not found", id)));
    }

    let rows = RegistrationRepository::list_for_user(&state.db, id, !query.all).await?;
    Ok(Json(rows))
}

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub reminders_enabled: bool,
}

/// Liveness probe. Reports 503 with a degraded status when the database
/// stops answering.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database_ok = sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.db)
        .await
        .is_ok();

    let status = if database_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if database_ok { "healthy" } else { "degraded" }.to_string(),
        database: if database_ok { "reachable" } else { "unreachable" }.to_string(),
        reminders_enabled: state.config.reminders.enabled,
    };

    (status, Json(response))
}

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::AppState;

/// Require an `Authorization: Bearer <ADMIN_API_TOKEN>` header on operator
/// endpoints. The token is compared verbatim against the configured value.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let provided = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match provided {
        Some(token) if token == state.config.admin.api_token => next.run(req).await,
        _ => AppError::Unauthorized.into_response(),
    }
}

pub mod events;
pub mod health;
pub mod registrations;
pub mod users;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Assemble the full application router.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .nest("/api/users", users::router())
        .nest("/api/events", events::router(state.clone()))
        .nest("/api/registrations", registrations::router())
        // Add shared state
        .with_state(state)
        // Add middleware
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::test_pool;
    use crate::services::notifier::testing::FakeNotifier;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::util::ServiceExt;

    async fn test_state() -> Arc<AppState> {
        let mut config = Config::default();
        config.admin.api_token = "secret".to_string();
        Arc::new(AppState {
            db: test_pool().await,
            config,
            notifier: Arc::new(FakeNotifier::new()),
        })
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_database_and_worker_state() {
        let app = app(test_state().await);

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "reachable");
        assert_eq!(body["reminders_enabled"], true);
    }

    #[tokio::test]
    async fn blank_first_name_is_rejected_in_russian() {
        let response = app(test_state().await)
            .oneshot(json_request(
                "PUT",
                "/api/users/1",
                serde_json::json!({ "first_name": "   " }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "Имя не может быть пустым");
    }

    #[tokio::test]
    async fn admin_routes_require_bearer_token() {
        let state = test_state().await;
        let payload = serde_json::json!({
            "title": "Rust митап",
            "category": "it",
            "format": "online",
            "starts_at": "2099-01-27T19:00:00",
            "location": "https://meet.example.com",
            "organizer_contact": "@organizer",
        });

        let response = app(state.clone())
            .oneshot(json_request("POST", "/api/events", payload.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let mut wrong = json_request("POST", "/api/events", payload.clone());
        wrong
            .headers_mut()
            .insert(header::AUTHORIZATION, "Bearer nope".parse().unwrap());
        let response = app(state.clone()).oneshot(wrong).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let mut authed = json_request("POST", "/api/events", payload);
        authed
            .headers_mut()
            .insert(header::AUTHORIZATION, "Bearer secret".parse().unwrap());
        let response = app(state).oneshot(authed).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        assert_eq!(body["event"]["title"], "Rust митап");
        assert_eq!(body["announcement"]["delivered"], 0);
    }

    #[tokio::test]
    async fn signup_flow_over_http() {
        let state = test_state().await;

        let response = app(state.clone())
            .oneshot(json_request(
                "PUT",
                "/api/users/100",
                serde_json::json!({ "first_name": "Анна", "username": "anna" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let mut create = json_request(
            "POST",
            "/api/events",
            serde_json::json!({
                "title": "Rust митап",
                "category": "it",
                "format": "online",
                "starts_at": "2099-01-27T19:00:00",
                "location": "https://meet.example.com",
                "organizer_contact": "@organizer",
            }),
        );
        create
            .headers_mut()
            .insert(header::AUTHORIZATION, "Bearer secret".parse().unwrap());
        let response = app(state.clone()).oneshot(create).await.unwrap();
        let event_id = body_json(response).await["event"]["id"].as_i64().unwrap();

        let signup = serde_json::json!({ "user_id": 100, "event_id": event_id });
        let response = app(state.clone())
            .oneshot(json_request("POST", "/api/registrations", signup.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["reminders_created"], 2);

        // Second signup is idempotent: 200, no new reminders.
        let response = app(state.clone())
            .oneshot(json_request("POST", "/api/registrations", signup))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["already_registered"], true);
        assert_eq!(body["reminders_created"], 0);

        // The registration shows up in the user's active list.
        let response = app(state)
            .oneshot(
                Request::get("/api/users/100/registrations")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_event_returns_not_found_body() {
        let app = app(test_state().await);

        let response = app
            .oneshot(Request::get("/api/events/9999").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}

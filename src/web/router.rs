//! Route definitions for the webhook server.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use teloxide::prelude::*;
use teloxide::types::Update;

use crate::error::Error;
use crate::store::Store;
use crate::telegram::handler::{extract_text_message, process_message};

/// Header Telegram echoes the configured secret back in.
pub const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Shared state for webhook request handling.
#[derive(Clone)]
pub struct AppState {
    pub bot: Bot,
    pub store: Store,
    pub webhook_secret: String,
}

/// Create the full app router.
pub fn create_app_router(state: AppState) -> Router {
    Router::new()
        .route("/telegram/webhook", post(telegram_webhook))
        .route("/health", get(health_check))
        .route("/", get(home))
        .with_state(state)
}

/// Liveness probe, no business logic.
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

/// Service identity payload.
async fn home() -> Json<serde_json::Value> {
    Json(json!({"ok": true, "service": "Accountability Coach"}))
}

fn verify_secret(expected: &str, presented: Option<&str>) -> Result<(), Error> {
    match presented {
        Some(value) if value == expected => Ok(()),
        Some(_) => Err(Error::Auth("webhook secret mismatch".to_string())),
        None => Err(Error::Auth("missing webhook secret header".to_string())),
    }
}

/// Push-mode ingestion endpoint.
///
/// Authentication happens before the body is touched. Once a request is
/// authenticated it is always acknowledged with `{"ok": true}` - malformed
/// payloads, store errors, and failed reply sends are internal concerns and
/// must not trigger platform-side redelivery storms.
async fn telegram_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let presented = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
    if let Err(e) = verify_secret(&state.webhook_secret, presented) {
        tracing::warn!("Rejected webhook request: {}", e);
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad secret"}))).into_response();
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            tracing::warn!("Discarding malformed update payload: {}", e);
            return accepted();
        }
    };

    if let Some((chat_id, text)) = extract_text_message(&update) {
        process_message(&state.bot, &state.store, chat_id, &text).await;
    }

    accepted()
}

fn accepted() -> Response {
    Json(json!({"ok": true})).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const START_UPDATE: &str = r#"{"update_id":1,"message":{"message_id":1,"date":0,"chat":{"id":111,"type":"private"},"from":{"id":111,"is_bot":false,"first_name":"Tester"},"text":"/start"}}"#;

    fn test_app(dir: &TempDir) -> (Router, Store) {
        let store = Store::open(dir.path().join("coach.db")).unwrap();
        let state = AppState {
            bot: Bot::new("123456:TEST"),
            store: store.clone(),
            webhook_secret: "top-secret".to_string(),
        };
        (create_app_router(state), store)
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let dir = TempDir::new().unwrap();
        let (app, _store) = test_app(&dir);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("ok"));
    }

    #[tokio::test]
    async fn test_home_identifies_service() {
        let dir = TempDir::new().unwrap();
        let (app, _store) = test_app(&dir);

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("Accountability Coach"));
    }

    #[tokio::test]
    async fn test_webhook_rejects_wrong_secret_before_processing() {
        let dir = TempDir::new().unwrap();
        let (app, store) = test_app(&dir);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/telegram/webhook")
                    .header(SECRET_HEADER, "wrong")
                    .header("content-type", "application/json")
                    .body(Body::from(START_UPDATE))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // Rejected before any persistence call: no user was created.
        assert!(store
            .with_tx(|repo| repo.find_user_by_chat_id(111))
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_webhook_rejects_missing_secret() {
        let dir = TempDir::new().unwrap();
        let (app, store) = test_app(&dir);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/telegram/webhook")
                    .header("content-type", "application/json")
                    .body(Body::from(START_UPDATE))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(store
            .with_tx(|repo| repo.find_user_by_chat_id(111))
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_webhook_acks_malformed_payload() {
        let dir = TempDir::new().unwrap();
        let (app, store) = test_app(&dir);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/telegram/webhook")
                    .header(SECRET_HEADER, "top-secret")
                    .header("content-type", "application/json")
                    .body(Body::from("this is not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("true"));
        assert!(store
            .with_tx(|repo| repo.find_user_by_chat_id(111))
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_webhook_drops_whitespace_only_text() {
        let dir = TempDir::new().unwrap();
        let (app, store) = test_app(&dir);

        let body = r#"{"update_id":2,"message":{"message_id":2,"date":0,"chat":{"id":111,"type":"private"},"from":{"id":111,"is_bot":false,"first_name":"Tester"},"text":"   "}}"#;
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/telegram/webhook")
                    .header(SECRET_HEADER, "top-secret")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        // Same no-op decision as the polling path: acked, nothing persisted.
        assert_eq!(response.status(), StatusCode::OK);
        assert!(store
            .with_tx(|repo| repo.find_user_by_chat_id(111))
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_webhook_acks_update_without_message() {
        let dir = TempDir::new().unwrap();
        let (app, store) = test_app(&dir);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/telegram/webhook")
                    .header(SECRET_HEADER, "top-secret")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"update_id":7}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(store
            .with_tx(|repo| repo.find_user_by_chat_id(111))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_verify_secret() {
        assert!(verify_secret("s3cret", Some("s3cret")).is_ok());
        assert!(matches!(
            verify_secret("s3cret", Some("nope")),
            Err(Error::Auth(_))
        ));
        assert!(matches!(verify_secret("s3cret", None), Err(Error::Auth(_))));
    }
}

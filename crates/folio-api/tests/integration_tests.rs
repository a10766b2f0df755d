//! Integration tests for the Folio API.
//!
//! Each test builds its own router over the built-in catalogue, an in-memory
//! guestbook and a canned language model.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use folio_api::create_router;
use folio_api::handlers::HealthResponse;
use folio_api::state::AppState;
use folio_chat::{
    load_catalogue, BuiltinCatalogue, ChatError, ChatOrchestrator, CompletionPrompt,
    ConversationEngine, FixedSelector, InMemoryGuestbook, LanguageModel,
};
use folio_core::FolioConfig;

// =============================================================================
// Helpers
// =============================================================================

const TEST_TOKEN: &str = "test-token-12345";

struct CannedModel;

#[async_trait]
impl LanguageModel for CannedModel {
    async fn complete(&self, prompt: &CompletionPrompt) -> Result<String, ChatError> {
        Ok(format!("Neural net says: {}", prompt.message))
    }
}

fn make_app_with(config: FolioConfig) -> axum::Router {
    let catalogue = load_catalogue(&BuiltinCatalogue).unwrap();
    let engine = ConversationEngine::new(Arc::new(catalogue), Arc::new(FixedSelector(0)));
    let guestbook = Arc::new(InMemoryGuestbook::new(&config.guestbook));
    let chat = ChatOrchestrator::new(engine, guestbook, &config)
        .with_language_model(Arc::new(CannedModel));
    create_router(AppState::new(config, chat, TEST_TOKEN))
}

fn make_app() -> axum::Router {
    make_app_with(FolioConfig::default())
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

fn admin_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", TEST_TOKEN))
        .body(Body::empty())
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send_chat(app: &axum::Router, message: &str, session_id: Option<&str>) -> Value {
    let body = match session_id {
        Some(sid) => serde_json::json!({ "message": message, "session_id": sid }),
        None => serde_json::json!({ "message": message }),
    };
    let resp = app
        .clone()
        .oneshot(post_json("/chat", &body.to_string()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_reports_catalogue() {
    let resp = make_app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let health: HealthResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(health.status, "ok");
    assert!(health.topics > 20);
    assert_eq!(health.quiz_questions, 3);
}

// =============================================================================
// Chat
// =============================================================================

#[tokio::test]
async fn test_chat_local_reply() {
    let app = make_app();
    let json = send_chat(&app, "hello there", None).await;
    assert_eq!(json["kind"], "local");
    assert_eq!(json["topic"], "greeting");
    assert!(json["session_id"].as_str().is_some());
    assert!(json.get("follow_up_prompt").is_none());
}

#[tokio::test]
async fn test_chat_follow_up_round_trip() {
    let app = make_app();
    let first = send_chat(&app, "tell me about edward", None).await;
    assert_eq!(first["topic"], "bio");
    assert_eq!(
        first["follow_up_prompt"],
        "Do you want to see his contact info to hire him?"
    );

    let sid = first["session_id"].as_str().unwrap().to_string();
    let second = send_chat(&app, "yes", Some(&sid)).await;
    assert_eq!(second["session_id"], sid.as_str());
    assert!(second["text"]
        .as_str()
        .unwrap()
        .contains("edwardmagejo@gmail.com"));

    // Consumed once: a second "yes" no longer hits the follow-up.
    let third = send_chat(&app, "yes", Some(&sid)).await;
    assert_eq!(third["kind"], "assistant");
}

#[tokio::test]
async fn test_chat_quiz_mode() {
    let app = make_app();
    let start = send_chat(&app, "start quiz", None).await;
    assert_eq!(start["kind"], "command");
    let sid = start["session_id"].as_str().unwrap().to_string();

    let answer = send_chat(&app, "no idea", Some(&sid)).await;
    assert_eq!(answer["kind"], "quiz");
}

#[tokio::test]
async fn test_chat_unmatched_uses_language_model() {
    let app = make_app();
    let json = send_chat(&app, "xyzzy plugh", None).await;
    assert_eq!(json["kind"], "assistant");
    assert_eq!(json["text"], "Neural net says: xyzzy plugh");
}

#[tokio::test]
async fn test_chat_empty_message_returns_400() {
    let resp = make_app()
        .oneshot(post_json("/chat", r#"{"message": "   "}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "bad_request");
}

#[tokio::test]
async fn test_chat_too_long_returns_400() {
    let long = "a".repeat(501);
    let body = serde_json::json!({ "message": long }).to_string();
    let resp = make_app().oneshot(post_json("/chat", &body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert!(json["message"].as_str().unwrap().contains("500"));
}

#[tokio::test]
async fn test_chat_disabled_returns_503() {
    let mut config = FolioConfig::default();
    config.chat.enabled = false;
    let resp = make_app_with(config)
        .oneshot(post_json("/chat", r#"{"message": "hello"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "service_unavailable");
}

#[tokio::test]
async fn test_chat_rate_limited() {
    let mut config = FolioConfig::default();
    config.server.rate_limit_per_sec = 2;
    let app = make_app_with(config);

    let mut statuses = Vec::new();
    for _ in 0..5 {
        let resp = app
            .clone()
            .oneshot(post_json("/chat", r#"{"message": "hello"}"#))
            .await
            .unwrap();
        statuses.push(resp.status());
    }
    assert!(statuses.contains(&StatusCode::TOO_MANY_REQUESTS));
}

// =============================================================================
// Session management
// =============================================================================

#[tokio::test]
async fn test_sessions_require_token() {
    let app = make_app();
    let resp = app
        .clone()
        .oneshot(Request::get("/chat/sessions").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "unauthorized");

    let resp = app
        .oneshot(
            Request::get("/chat/sessions")
                .header("authorization", "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sessions_list_and_history() {
    let app = make_app();
    let reply = send_chat(&app, "My name is Alex", None).await;
    let sid = reply["session_id"].as_str().unwrap().to_string();

    let resp = app
        .clone()
        .oneshot(admin_request("GET", "/chat/sessions"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let sessions = body_json(resp).await;
    assert_eq!(sessions.as_array().unwrap().len(), 1);
    assert_eq!(sessions[0]["remembered_name"], "Alex");

    let resp = app
        .oneshot(admin_request("GET", &format!("/chat/sessions/{sid}/history")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let history = body_json(resp).await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["role"], "user");
    assert_eq!(history[1]["content"], "Nice to meet you, Alex. Memory updated. 🔋");
}

#[tokio::test]
async fn test_history_unknown_session_returns_404() {
    let uri = format!("/chat/sessions/{}/history", Uuid::new_v4());
    let resp = make_app()
        .oneshot(admin_request("GET", &uri))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn test_delete_session() {
    let app = make_app();
    let reply = send_chat(&app, "hello", None).await;
    let uri = format!("/chat/sessions/{}", reply["session_id"].as_str().unwrap());

    let resp = app
        .clone()
        .oneshot(admin_request("DELETE", &uri))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app.oneshot(admin_request("DELETE", &uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Guestbook
// =============================================================================

#[tokio::test]
async fn test_guestbook_sign_and_list() {
    let app = make_app();
    let resp = app
        .clone()
        .oneshot(post_json(
            "/guestbook",
            r#"{"name": "Sam", "message": "Slick terminal"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app
        .oneshot(Request::get("/guestbook").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let entries = body_json(resp).await;
    assert_eq!(entries[0]["name"], "Sam");
    assert_eq!(entries[0]["message"], "Slick terminal");
}

#[tokio::test]
async fn test_guestbook_invalid_entry_returns_400() {
    let resp = make_app()
        .oneshot(post_json("/guestbook", r#"{"name": "", "message": "hi"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_guestbook_long_name_returns_400() {
    let body = serde_json::json!({ "name": "n".repeat(10_000), "message": "hi" }).to_string();
    let app = make_app();
    let resp = app
        .clone()
        .oneshot(post_json("/guestbook", &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert!(json["message"].as_str().unwrap().contains("name exceeds 40"));

    let resp = app
        .oneshot(Request::get("/guestbook").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_guestbook_sign_rate_limited() {
    let mut config = FolioConfig::default();
    config.server.rate_limit_per_sec = 2;
    let app = make_app_with(config);

    let mut statuses = Vec::new();
    for i in 0..5 {
        let body = serde_json::json!({ "name": "Sam", "message": format!("spam {i}") });
        let resp = app
            .clone()
            .oneshot(post_json("/guestbook", &body.to_string()))
            .await
            .unwrap();
        statuses.push(resp.status());
    }
    assert!(statuses.contains(&StatusCode::TOO_MANY_REQUESTS));

    // Reads stay outside the limiter.
    let resp = app
        .oneshot(Request::get("/guestbook").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_sign_command_visible_in_guestbook() {
    let app = make_app();
    let reply = send_chat(&app, "sign Hello from the terminal", None).await;
    assert_eq!(reply["text"], "Signature saved.");

    let resp = app
        .oneshot(Request::get("/guestbook").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let entries = body_json(resp).await;
    assert_eq!(entries[0]["name"], "Anon");
    assert_eq!(entries[0]["message"], "Hello from the terminal");
}

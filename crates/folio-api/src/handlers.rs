//! Route handlers for the Folio API.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use folio_chat::{ChatMessage, ChatReply, GuestbookEntry, SessionSummary};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Health
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub topics: usize,
    pub quiz_questions: usize,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let catalogue = state.chat.engine().catalogue();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        topics: catalogue.topics().len(),
        quiz_questions: catalogue.quiz_bank().len(),
    })
}

// =============================================================================
// Chat
// =============================================================================

/// Request body for POST /chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: Option<Uuid>,
}

/// POST /chat - run one terminal turn.
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    let (reply, _) = state
        .chat
        .handle_message(&body.message, body.session_id)
        .await?;
    Ok(Json(reply))
}

/// GET /chat/sessions
pub async fn list_sessions(State(state): State<AppState>) -> Json<Vec<SessionSummary>> {
    Json(state.chat.list_sessions())
}

/// GET /chat/sessions/{id}/history
pub async fn session_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    Ok(Json(state.chat.get_history(id)?))
}

/// DELETE /chat/sessions/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.chat.delete_session(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Guestbook
// =============================================================================

/// Request body for POST /guestbook.
#[derive(Debug, Deserialize)]
pub struct SignRequest {
    pub name: String,
    pub message: String,
}

/// GET /guestbook - newest entries first.
pub async fn list_guestbook(
    State(state): State<AppState>,
) -> Result<Json<Vec<GuestbookEntry>>, ApiError> {
    let limit = state.config.guestbook.list_limit;
    Ok(Json(state.chat.guestbook().list(limit).await?))
}

/// POST /guestbook
pub async fn sign_guestbook(
    State(state): State<AppState>,
    Json(body): Json<SignRequest>,
) -> Result<(StatusCode, Json<GuestbookEntry>), ApiError> {
    let entry = state
        .chat
        .guestbook()
        .append(&body.name, &body.message)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

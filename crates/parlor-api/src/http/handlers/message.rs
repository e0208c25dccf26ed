//! Message HTTP handlers, including the server-side send flow.
//!
//! Endpoints:
//! - GET  /api/v1/sessions/{id}/messages - List messages for a session
//! - POST /api/v1/sessions/{id}/messages - Send a message and get the reply
//!
//! The send flow persists the user message first, then requests a completion
//! and persists the bot reply. If the completion fails the user message stays
//! persisted and the handler returns 502; the client can retry with a new
//! message without losing what was said.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use parlor_core::llm::gateway::CompletionGateway;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::handlers::session::{owned_session, parse_uuid};
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for POST /sessions/{id}/messages.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// GET /api/v1/sessions/{id}/messages - List messages, oldest first.
pub async fn list_messages(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<serde_json::Value>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sid = parse_uuid(&session_id)?;
    owned_session(&state, &user, &sid).await?;

    let messages = state.chat_store.list_messages(&sid).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let messages_json: Vec<serde_json::Value> = messages
        .iter()
        .map(|m| serde_json::to_value(m).unwrap())
        .collect();

    let resp = ApiResponse::success(messages_json, request_id, elapsed)
        .with_link("self", &format!("/api/v1/sessions/{session_id}/messages"))
        .with_link("session", &format!("/api/v1/sessions/{session_id}"));

    Ok(Json(resp))
}

/// POST /api/v1/sessions/{id}/messages - Append a user message, request a
/// completion, and return both persisted messages.
pub async fn send_message(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    Path(session_id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sid = parse_uuid(&session_id)?;
    let session = owned_session(&state, &user, &sid).await?;

    let content = body.content.trim();
    if content.is_empty() {
        return Err(AppError::Validation(
            "message content cannot be empty".to_string(),
        ));
    }

    let bot = state.bot_service.get_bot(&session.bot_id).await?;

    let user_message = state
        .chat_store
        .append_user_message(sid, &user, content)
        .await?;

    let reply = state
        .gateway
        .complete(&bot.system_prompt, content)
        .await
        .map_err(|e| {
            warn!(session_id = %sid, error = %e, "Completion failed; user message retained");
            AppError::Completion(e)
        })?;

    let bot_message = state
        .chat_store
        .append_bot_message(sid, &bot.id, &reply)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;

    let data = serde_json::json!({
        "user": serde_json::to_value(&user_message).unwrap(),
        "assistant": serde_json::to_value(&bot_message).unwrap(),
    });

    let resp = ApiResponse::success(data, request_id, elapsed)
        .with_link("self", &format!("/api/v1/sessions/{session_id}/messages"))
        .with_link("session", &format!("/api/v1/sessions/{session_id}"));

    Ok(Json(resp))
}

//! Session CRUD HTTP handlers.
//!
//! Endpoints:
//! - GET    /api/v1/bots/{id}/sessions - List sessions for a bot
//! - POST   /api/v1/bots/{id}/sessions - Create a session for a bot
//! - GET    /api/v1/sessions/{id}      - Get a single session
//! - DELETE /api/v1/sessions/{id}      - Delete a session and its messages

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use parlor_types::chat::ChatSession;
use parlor_types::error::ChatError;
use parlor_types::identity::UserId;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::handlers::bot::{owned_bot, parse_bot_id};
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Parse a UUID from a path parameter, returning a 400 error on invalid format.
pub(super) fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    s.parse::<Uuid>()
        .map_err(|_| AppError::Validation(format!("Invalid UUID: {s}")))
}

/// Fetch a session and verify the caller owns it. A session owned by someone
/// else is reported as not found so IDs don't leak across users.
pub(super) async fn owned_session(
    state: &AppState,
    caller: &UserId,
    session_id: &Uuid,
) -> Result<ChatSession, AppError> {
    let session = state
        .chat_store
        .get_session(session_id)
        .await?
        .ok_or(AppError::Chat(ChatError::SessionNotFound))?;
    if session.owner_id != *caller {
        return Err(AppError::Chat(ChatError::SessionNotFound));
    }
    Ok(session)
}

/// GET /api/v1/bots/{id}/sessions - List sessions for a bot, most recently
/// active first.
pub async fn list_sessions(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<serde_json::Value>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let bot_id = parse_bot_id(&id)?;
    let bot = owned_bot(&state, &user, &bot_id).await?;

    let sessions = state.chat_store.list_sessions(&user, &bot.id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let sessions_json: Vec<serde_json::Value> = sessions
        .iter()
        .map(|s| serde_json::to_value(s).unwrap())
        .collect();

    let resp = ApiResponse::success(sessions_json, request_id, elapsed)
        .with_link("self", &format!("/api/v1/bots/{}/sessions", bot.id));

    Ok(Json(resp))
}

/// POST /api/v1/bots/{id}/sessions - Create a new session for a bot.
pub async fn create_session(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let bot_id = parse_bot_id(&id)?;
    let bot = owned_bot(&state, &user, &bot_id).await?;

    let session = state.chat_store.create_session(&user, &bot.id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let session_json = serde_json::to_value(&session).unwrap();
    let resp = ApiResponse::success(session_json, request_id, elapsed)
        .with_link("self", &format!("/api/v1/sessions/{}", session.id))
        .with_link(
            "messages",
            &format!("/api/v1/sessions/{}/messages", session.id),
        );

    Ok(Json(resp))
}

/// GET /api/v1/sessions/{id} - Get a session by ID.
pub async fn get_session(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sid = parse_uuid(&session_id)?;
    let session = owned_session(&state, &user, &sid).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let session_json = serde_json::to_value(&session).unwrap();
    let resp = ApiResponse::success(session_json, request_id, elapsed)
        .with_link("self", &format!("/api/v1/sessions/{}", session.id))
        .with_link(
            "messages",
            &format!("/api/v1/sessions/{}/messages", session.id),
        )
        .with_link("bot", &format!("/api/v1/bots/{}", session.bot_id));

    Ok(Json(resp))
}

/// DELETE /api/v1/sessions/{id} - Delete a session and its messages.
pub async fn delete_session(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sid = parse_uuid(&session_id)?;
    state.chat_store.delete_session(&user, &sid).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(
        serde_json::json!({"deleted": true, "session_id": session_id}),
        request_id,
        elapsed,
    );

    Ok(Json(resp))
}

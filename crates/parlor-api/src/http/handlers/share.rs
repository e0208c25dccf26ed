//! Bot sharing HTTP handlers.
//!
//! Sharing duplicates a bot: the recipient gets an independent copy whose
//! `shared_from` field points back at the source. Later edits to either copy
//! never affect the other.
//!
//! Endpoints:
//! - POST /api/v1/bots/{id}/share - Duplicate a bot to a user
//! - GET  /api/v1/share/{id}      - Public preview of a shareable bot

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;

use parlor_types::identity::UserId;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::handlers::bot::parse_bot_id;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for POST /bots/{id}/share. When `target_user_id` is omitted
/// the copy goes to the caller (accepting a bot someone shared with you).
#[derive(Debug, Default, Deserialize)]
pub struct ShareBotRequest {
    #[serde(default)]
    pub target_user_id: Option<String>,
}

/// POST /api/v1/bots/{id}/share - Duplicate a bot to a user.
pub async fn share_bot(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
    body: Option<Json<ShareBotRequest>>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let bot_id = parse_bot_id(&id)?;
    let recipient = body
        .and_then(|Json(b)| b.target_user_id)
        .map(UserId::new)
        .unwrap_or(user);

    let copy = state.bot_service.share_bot(&bot_id, &recipient).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let copy_json = serde_json::to_value(&copy).unwrap();
    let resp = ApiResponse::success(copy_json, request_id, elapsed)
        .with_link("self", &format!("/api/v1/bots/{}", copy.id))
        .with_link("source", &format!("/api/v1/bots/{bot_id}"));

    Ok(Json(resp))
}

/// GET /api/v1/share/{id} - Preview a shareable bot without authentication.
///
/// Exposes only the fields a recipient needs to decide whether to accept:
/// name, system prompt, and description.
pub async fn share_preview(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let bot_id = parse_bot_id(&id)?;
    let preview = state.bot_service.share_preview(&bot_id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let preview_json = serde_json::to_value(&preview).unwrap();
    let resp = ApiResponse::success(preview_json, request_id, elapsed)
        .with_link("self", &format!("/api/v1/share/{bot_id}"));

    Ok(Json(resp))
}

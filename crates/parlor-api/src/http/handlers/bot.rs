//! Bot CRUD handlers for the REST API.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};

use parlor_types::bot::{Bot, BotId, CreateBotRequest, UpdateBotRequest};
use parlor_types::error::BotError;
use parlor_types::identity::UserId;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Parse a bot ID from a path parameter, returning a 400 error on invalid format.
pub(super) fn parse_bot_id(s: &str) -> Result<BotId, AppError> {
    s.parse::<BotId>()
        .map_err(|_| AppError::Validation(format!("Invalid bot ID: {s}")))
}

/// Fetch a bot and verify the caller owns it. A bot owned by someone else is
/// reported as not found so IDs don't leak across users.
pub(super) async fn owned_bot(
    state: &AppState,
    caller: &UserId,
    id: &BotId,
) -> Result<Bot, AppError> {
    let bot = state.bot_service.get_bot(id).await?;
    if bot.owner_id != *caller {
        return Err(AppError::Bot(BotError::NotFound));
    }
    Ok(bot)
}

/// POST /api/v1/bots - Create a new bot.
pub async fn create_bot(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    Json(body): Json<CreateBotRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let bot = state.bot_service.create_bot(&user, body).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let bot_json = serde_json::to_value(&bot).unwrap();
    let resp = ApiResponse::success(bot_json, request_id, elapsed)
        .with_link("self", &format!("/api/v1/bots/{}", bot.id))
        .with_link("sessions", &format!("/api/v1/bots/{}/sessions", bot.id));

    Ok(Json(resp))
}

/// GET /api/v1/bots - List the caller's bots.
pub async fn list_bots(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
) -> Result<Json<ApiResponse<Vec<serde_json::Value>>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let bots = state.bot_service.list_bots(&user).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let bots_json: Vec<serde_json::Value> = bots
        .iter()
        .map(|b| serde_json::to_value(b).unwrap())
        .collect();

    let resp = ApiResponse::success(bots_json, request_id, elapsed).with_link("self", "/api/v1/bots");

    Ok(Json(resp))
}

/// GET /api/v1/bots/{id} - Get a bot by ID.
pub async fn get_bot(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let bot_id = parse_bot_id(&id)?;
    let bot = owned_bot(&state, &user, &bot_id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let bot_json = serde_json::to_value(&bot).unwrap();
    let resp = ApiResponse::success(bot_json, request_id, elapsed)
        .with_link("self", &format!("/api/v1/bots/{}", bot.id))
        .with_link("sessions", &format!("/api/v1/bots/{}/sessions", bot.id))
        .with_link("share", &format!("/api/v1/bots/{}/share", bot.id));

    Ok(Json(resp))
}

/// PUT /api/v1/bots/{id} - Update a bot.
pub async fn update_bot(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
    Json(body): Json<UpdateBotRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let bot_id = parse_bot_id(&id)?;
    let bot = state.bot_service.update_bot(&user, &bot_id, body).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let bot_json = serde_json::to_value(&bot).unwrap();
    let resp = ApiResponse::success(bot_json, request_id, elapsed)
        .with_link("self", &format!("/api/v1/bots/{}", bot.id));

    Ok(Json(resp))
}

/// DELETE /api/v1/bots/{id} - Delete a bot and its sessions.
pub async fn delete_bot(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let bot_id = parse_bot_id(&id)?;
    state.bot_service.delete_bot(&user, &bot_id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(
        serde_json::json!({"deleted": true, "bot_id": id}),
        request_id,
        elapsed,
    );

    Ok(Json(resp))
}

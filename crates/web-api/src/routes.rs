use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use infrastructure::{DispatcherStats, RegistryStats};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use application::services::{CreateChatRequest, CreateUserRequest, SendMessageRequest};
use application::{
    ChatDetailsDto, ChatDto, ChatLookupDto, MessageDto, UserDto, UserSummaryDto,
};

use crate::{error::ApiError, state::AppState, websocket::websocket_upgrade};

#[derive(Debug, Deserialize)]
struct CreateUserPayload {
    username: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    username: String,
}

#[derive(Debug, Deserialize)]
struct CreateChatPayload {
    name: String,
    #[serde(default)]
    is_group: bool,
    #[serde(default)]
    user_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct SendMessagePayload {
    sender_id: i64,
    content: String,
}

/// 实时推送的运行计数
#[derive(Debug, Serialize)]
struct RealtimeStats {
    #[serde(flatten)]
    connections: RegistryStats,
    #[serde(flatten)]
    dispatch: DispatcherStats,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ws", get(websocket_upgrade))
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user).get(list_users))
        .route("/users/search", get(search_users))
        .route("/users/{id}", get(get_user))
        .route("/chats/create", post(create_chat))
        .route("/chats/check", post(check_chat))
        .route("/chats/{id}", get(get_chat))
        .route("/chats/{chat_id}/send-message", post(send_message))
        .route("/chats/{chat_id}/messages", get(list_messages))
        .route("/realtime/stats", get(realtime_stats))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    let dto = state
        .user_service
        .create_user(CreateUserRequest {
            username: payload.username,
            email: payload.email,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(dto)))
}

async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserSummaryDto>>, ApiError> {
    Ok(Json(state.user_service.list_users().await?))
}

async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<UserSummaryDto>>, ApiError> {
    Ok(Json(state.user_service.search_users(&query.username).await?))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserDto>, ApiError> {
    Ok(Json(state.user_service.get_user(id).await?))
}

async fn create_chat(
    State(state): State<AppState>,
    Json(payload): Json<CreateChatPayload>,
) -> Result<(StatusCode, Json<ChatDto>), ApiError> {
    let dto = state
        .chat_service
        .create_chat(CreateChatRequest {
            name: payload.name,
            is_group: payload.is_group,
            user_ids: payload.user_ids,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(dto)))
}

async fn check_chat(
    State(state): State<AppState>,
    Json(user_ids): Json<Vec<i64>>,
) -> Result<Json<ChatLookupDto>, ApiError> {
    Ok(Json(state.chat_service.find_chat_by_members(user_ids).await?))
}

async fn get_chat(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ChatDetailsDto>, ApiError> {
    Ok(Json(state.chat_service.get_chat(id).await?))
}

async fn send_message(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
    Json(payload): Json<SendMessagePayload>,
) -> Result<Json<MessageDto>, ApiError> {
    let dto = state
        .chat_service
        .send_message(SendMessageRequest {
            chat_id,
            sender_id: payload.sender_id,
            content: payload.content,
        })
        .await?;

    Ok(Json(dto))
}

async fn list_messages(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
) -> Result<Json<Vec<MessageDto>>, ApiError> {
    Ok(Json(state.chat_service.list_messages(chat_id).await?))
}

async fn realtime_stats(State(state): State<AppState>) -> Json<RealtimeStats> {
    Json(RealtimeStats {
        connections: state.registry.stats().await,
        dispatch: state.dispatcher.stats(),
    })
}

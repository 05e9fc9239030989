//! Conversation endpoints.
//!
//! - POST /api/v1/chats/{chat_id}/turns    - append one turn as given
//! - POST /api/v1/chats/{chat_id}/messages - run one chat exchange
//! - GET|POST /api/v1/chats/{chat_id}/export - full history, oldest first

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::Value;

use catsim_core::chat::service::ConverseOutcome;
use catsim_types::chat::{AppendedRecord, MessageRecord};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for appending a turn. Every field is optional; missing or
/// unusable values are defaulted by the store.
#[derive(Debug, Default, Deserialize)]
pub struct AppendTurnRequest {
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub ttl: Option<Value>,
}

/// Request body for a chat exchange.
#[derive(Debug, Deserialize)]
pub struct ConverseRequest {
    pub message: Value,
}

fn require_chat_id(chat_id: &str) -> Result<(), AppError> {
    if chat_id.trim().is_empty() {
        return Err(AppError::Validation("chat id must not be empty".to_string()));
    }
    Ok(())
}

fn export_link(chat_id: &str) -> String {
    format!("/api/v1/chats/{chat_id}/export")
}

/// POST /api/v1/chats/{chat_id}/turns
pub async fn append_turn(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Json(body): Json<AppendTurnRequest>,
) -> Result<ApiResponse<AppendedRecord>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();
    require_chat_id(&chat_id)?;

    let appended = state
        .chat_service
        .append_turn(&chat_id, body.message, body.timestamp, body.ttl)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(appended, request_id, elapsed)
        .with_link("conversation", &export_link(&chat_id)))
}

/// POST /api/v1/chats/{chat_id}/messages
pub async fn converse(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Json(body): Json<ConverseRequest>,
) -> Result<ApiResponse<ConverseOutcome>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();
    require_chat_id(&chat_id)?;

    let outcome = state.chat_service.converse(&chat_id, body.message).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(outcome, request_id, elapsed)
        .with_link("conversation", &export_link(&chat_id)))
}

/// GET|POST /api/v1/chats/{chat_id}/export
pub async fn export_conversation(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> Result<ApiResponse<Vec<MessageRecord>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();
    require_chat_id(&chat_id)?;

    let records = state.chat_service.export_conversation(&chat_id).await?;

    tracing::debug!(chat_id = %chat_id, count = records.len(), "Exported conversation");

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(records, request_id, elapsed)
        .with_link("self", &export_link(&chat_id)))
}

//! GET /api/v1/stats - store counters since process start.

use std::time::Instant;

use axum::extract::State;
use serde::Serialize;

use catsim_core::chat::repository::ConversationTable;
use catsim_core::chat::store::StoreStats;
use catsim_core::llm::provider::ChatModel;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub table: String,
    pub model: String,
    pub store: StoreStats,
}

pub async fn get_stats(
    State(state): State<AppState>,
) -> Result<ApiResponse<StatsResponse>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let service = &state.chat_service;
    let stats = StatsResponse {
        table: service.store().table().table_name().to_string(),
        model: service.model().name().to_string(),
        store: service.store().stats(),
    };

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(stats, request_id, elapsed))
}

//! Chat endpoint - one completed exchange per request.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::error::ApiError;
use crate::services;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
    /// Provider name; the configured default when omitted.
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub id: String,
    pub user_id: String,
    pub message: String,
    pub timestamp: String,
    pub tokens_used: u32,
    pub memory_injected: bool,
}

// POST /api/v1/chat
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if request.user_id.trim().is_empty() {
        return Err(ApiError::validation("user_id must not be empty"));
    }
    if request.message.trim().is_empty() {
        return Err(ApiError::validation("message must not be empty"));
    }

    let response = services::chat::run_turn(&state, request).await?;
    Ok(Json(response))
}

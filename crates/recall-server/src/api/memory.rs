//! Memory maintenance endpoints: listing, pruning and summarization.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::error::ApiError;
use recall_ai::memory::DEFAULT_RETENTION_DAYS;
use recall_storage::MemoryRecord;

#[derive(Debug, Deserialize)]
pub struct PruneRequest {
    pub user_id: String,
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
    /// When present, only memories below this importance are deleted.
    #[serde(default)]
    pub min_importance: Option<u8>,
}

fn default_retention_days() -> i64 {
    DEFAULT_RETENTION_DAYS
}

#[derive(Debug, Serialize)]
pub struct PruneResponse {
    pub pruned_count: usize,
    pub retention_days: i64,
}

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    pub summary: String,
}

// POST /api/v1/memory/prune
pub async fn prune_memory(
    State(state): State<AppState>,
    Json(request): Json<PruneRequest>,
) -> Result<Json<PruneResponse>, ApiError> {
    if request.user_id.trim().is_empty() {
        return Err(ApiError::validation("user_id must not be empty"));
    }

    let pruned_count = match request.min_importance {
        Some(threshold) => state.engine.prune_below_importance(
            &request.user_id,
            request.retention_days,
            threshold,
        )?,
        None => state.engine.prune(&request.user_id, request.retention_days)?,
    };

    tracing::info!(
        user_id = %request.user_id,
        pruned_count,
        retention_days = request.retention_days,
        "pruned memories"
    );

    Ok(Json(PruneResponse {
        pruned_count,
        retention_days: request.retention_days,
    }))
}

// POST /api/v1/memory/summarize
pub async fn summarize_memory(
    State(state): State<AppState>,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, ApiError> {
    if state.storage.users.get(&request.user_id)?.is_none() {
        return Err(ApiError::not_found("User"));
    }

    let summary = state
        .engine
        .summarize_conversation(&request.user_id)?
        .ok_or_else(|| ApiError::validation("No chat history to summarize"))?;

    Ok(Json(SummarizeResponse { summary }))
}

// GET /api/v1/memory/{user_id}
pub async fn list_memories(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<MemoryRecord>>, ApiError> {
    let memories = state.storage.memories.list_for_user(&user_id)?;
    Ok(Json(memories))
}

//! User profile and preferences endpoints.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::api::state::AppState;
use crate::error::ApiError;
use recall_storage::UserProfile;

#[derive(Debug, Serialize)]
pub struct UserView {
    pub user_id: String,
    pub profile: UserProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    pub message_count: u64,
    pub created_at: String,
    pub updated_at: String,
    pub last_active: String,
}

#[derive(Debug, Deserialize)]
pub struct PreferencesUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub tone_preference: Option<String>,
    #[serde(default)]
    pub custom_instructions: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

// GET /api/v1/user/{user_id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserView>, ApiError> {
    let user = state
        .storage
        .users
        .get(&user_id)?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(Json(UserView {
        user_id: user.user_id,
        profile: user.profile,
        system_prompt: user.system_prompt,
        message_count: user.message_count,
        created_at: user.created_at.to_rfc3339(),
        updated_at: user.updated_at.to_rfc3339(),
        last_active: user.last_active.to_rfc3339(),
    }))
}

// POST /api/v1/user/{user_id}/preferences
pub async fn update_preferences(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(update): Json<PreferencesUpdate>,
) -> Result<Json<Value>, ApiError> {
    if user_id.trim().is_empty() {
        return Err(ApiError::validation("user_id must not be empty"));
    }

    let mut user = state.storage.users.get_or_create(&user_id)?;

    if let Some(name) = update.name {
        user.profile.name = Some(name);
    }
    if let Some(language) = update.language {
        user.profile.language = Some(language);
    }
    if let Some(tone) = update.tone_preference {
        user.profile.tone_preference = Some(tone);
    }
    if let Some(instructions) = update.custom_instructions {
        user.profile.custom_instructions = Some(instructions);
    }
    if let Some(prompt) = update.system_prompt {
        user.system_prompt = Some(prompt);
    }
    user.updated_at = Utc::now();

    state.storage.users.put(&user)?;
    tracing::info!(user_id = %user.user_id, "updated user preferences");

    Ok(Json(json!({
        "user_id": user.user_id,
        "profile": user.profile,
        "updated_at": user.updated_at.to_rfc3339(),
    })))
}

pub mod chat;
pub mod memory;
pub mod state;
pub mod user;

use axum::{Json, extract::State};
use chrono::Utc;
use serde::Serialize;

pub use state::AppState;

#[derive(Serialize)]
pub struct Health {
    status: String,
    version: String,
    providers: Vec<&'static str>,
    timestamp: String,
}

// GET /health
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        providers: state.llm.configured_providers(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

//! Recall server - HTTP surface over the memory engine and provider clients.

pub mod api;
pub mod config;
pub mod error;
pub mod services;

use std::sync::Arc;

use axum::{
    Router,
    http::{Method, header},
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use config::ServerConfig;
use recall_ai::llm::{ChatProvider, LlmClientFactory};
use recall_ai::memory::MemoryEngine;
use recall_storage::Storage;

/// Core application state shared across all API handlers
pub struct AppCore {
    pub storage: Arc<Storage>,
    pub engine: MemoryEngine,
    pub llm: LlmClientFactory,
    pub config: ServerConfig,
}

impl AppCore {
    pub fn new(config: ServerConfig, db_path: &str) -> anyhow::Result<Self> {
        let storage = Arc::new(Storage::new(db_path)?);
        let engine = MemoryEngine::new(storage.clone());

        let mut llm = LlmClientFactory::new(config.default_provider);
        if let Some(key) = &config.openai_api_key {
            llm = llm.with_api_key(ChatProvider::OpenAi, key);
        }
        if let Some(key) = &config.qwen_api_key {
            llm = llm.with_api_key(ChatProvider::Qwen, key);
        }
        if let Some(key) = &config.deepseek_api_key {
            llm = llm.with_api_key(ChatProvider::DeepSeek, key);
        }
        if let Some(url) = &config.openai_base_url {
            llm = llm.with_openai_base_url(url);
        }

        Ok(Self {
            storage,
            engine,
            llm,
            config,
        })
    }
}

/// Build the application router with all routes and middleware.
pub fn build_router(state: Arc<AppCore>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(api::health))
        .route("/api/v1/chat", post(api::chat::chat))
        .route("/api/v1/user/{user_id}", get(api::user::get_user))
        .route(
            "/api/v1/user/{user_id}/preferences",
            post(api::user::update_preferences),
        )
        .route("/api/v1/memory/prune", post(api::memory::prune_memory))
        .route(
            "/api/v1/memory/summarize",
            post(api::memory::summarize_memory),
        )
        .route("/api/v1/memory/{user_id}", get(api::memory::list_memories))
        .layer(cors)
        .with_state(state)
}

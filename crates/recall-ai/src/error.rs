//! Error types for the AI module

use thiserror::Error;

/// AI module error types
#[derive(Error, Debug)]
pub enum AiError {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("{provider} API error: {status} - {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("{0} API key is not configured")]
    MissingApiKey(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Result type alias for AI operations
pub type Result<T> = std::result::Result<T, AiError>;

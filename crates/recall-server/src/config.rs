//! Server configuration from environment variables.

use std::env;

use recall_ai::llm::ChatProvider;
use recall_ai::memory::{DEFAULT_RETENTION_DAYS, ImportancePolicy, RecallStrategy};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Explicit database path; falls back to the Recall data directory.
    pub database_path: Option<String>,

    pub openai_api_key: Option<String>,
    pub qwen_api_key: Option<String>,
    pub deepseek_api_key: Option<String>,
    /// Override for OpenAI-compatible gateways.
    pub openai_base_url: Option<String>,
    pub default_provider: ChatProvider,

    pub recall_strategy: RecallStrategy,
    pub importance_policy: ImportancePolicy,
    pub memory_retention_days: i64,
    /// Accepted and forwarded to providers; assembled context is not
    /// measured against it.
    pub max_context_tokens: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_path: None,
            openai_api_key: None,
            qwen_api_key: None,
            deepseek_api_key: None,
            openai_base_url: None,
            default_provider: ChatProvider::OpenAi,
            recall_strategy: RecallStrategy::default(),
            importance_policy: ImportancePolicy::default(),
            memory_retention_days: DEFAULT_RETENTION_DAYS,
            max_context_tokens: default_max_context_tokens(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_context_tokens() -> u32 {
    8000
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = env::var("RECALL_SERVER_HOST").unwrap_or(defaults.host);
        let port = env::var("RECALL_SERVER_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(defaults.port);
        let database_path = env::var("RECALL_DB_PATH").ok();

        let default_provider = env::var("RECALL_DEFAULT_PROVIDER")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(defaults.default_provider);
        let recall_strategy = env::var("RECALL_STRATEGY")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(defaults.recall_strategy);
        let importance_policy = env::var("RECALL_IMPORTANCE_POLICY")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(defaults.importance_policy);
        let memory_retention_days = env::var("RECALL_RETENTION_DAYS")
            .ok()
            .and_then(|value| value.parse::<i64>().ok())
            .unwrap_or(defaults.memory_retention_days);
        let max_context_tokens = env::var("RECALL_MAX_CONTEXT_TOKENS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(defaults.max_context_tokens);

        Self {
            host,
            port,
            database_path,
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            qwen_api_key: env::var("QWEN_API_KEY").ok(),
            deepseek_api_key: env::var("DEEPSEEK_API_KEY").ok(),
            openai_base_url: env::var("RECALL_OPENAI_BASE_URL").ok(),
            default_provider,
            recall_strategy,
            importance_policy,
            memory_retention_days,
            max_context_tokens,
        }
    }
}

//! LLM client factory for configuration-driven provider selection

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{AiError, Result};
use crate::llm::{LlmClient, OpenAIClient, QwenClient};

const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";
const DEEPSEEK_DEFAULT_MODEL: &str = "deepseek-chat";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatProvider {
    OpenAi,
    Qwen,
    DeepSeek,
}

impl ChatProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Qwen => "qwen",
            Self::DeepSeek => "deepseek",
        }
    }
}

impl FromStr for ChatProvider {
    type Err = AiError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "qwen" => Ok(Self::Qwen),
            "deepseek" => Ok(Self::DeepSeek),
            other => Err(AiError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Builds per-request clients from configured API keys.
///
/// DeepSeek exposes an OpenAI-compatible API, so it is served by
/// [`OpenAIClient`] pointed at the DeepSeek base URL.
pub struct LlmClientFactory {
    api_keys: HashMap<ChatProvider, String>,
    default_provider: ChatProvider,
    openai_base_url: Option<String>,
}

impl LlmClientFactory {
    pub fn new(default_provider: ChatProvider) -> Self {
        Self {
            api_keys: HashMap::new(),
            default_provider,
            openai_base_url: None,
        }
    }

    pub fn with_api_key(mut self, provider: ChatProvider, key: impl Into<String>) -> Self {
        self.api_keys.insert(provider, key.into());
        self
    }

    /// Override the OpenAI base URL (API-compatible gateways).
    pub fn with_openai_base_url(mut self, url: impl Into<String>) -> Self {
        self.openai_base_url = Some(url.into());
        self
    }

    pub fn default_provider(&self) -> ChatProvider {
        self.default_provider
    }

    /// Providers with a configured API key, sorted by name.
    pub fn configured_providers(&self) -> Vec<&'static str> {
        let mut providers: Vec<&'static str> =
            self.api_keys.keys().map(ChatProvider::as_str).collect();
        providers.sort();
        providers
    }

    /// Create a client for the requested provider, falling back to the
    /// configured default when none is given.
    pub fn create(
        &self,
        provider: Option<ChatProvider>,
        model: Option<&str>,
    ) -> Result<Arc<dyn LlmClient>> {
        let provider = provider.unwrap_or(self.default_provider);

        match provider {
            ChatProvider::OpenAi => {
                let key = self.api_key(ChatProvider::OpenAi, "OpenAI")?;
                let mut client = OpenAIClient::new(key);
                if let Some(url) = &self.openai_base_url {
                    client = client.with_base_url(url);
                }
                if let Some(model) = model {
                    client = client.with_model(model);
                }
                Ok(Arc::new(client))
            }
            ChatProvider::DeepSeek => {
                let key = self.api_key(ChatProvider::DeepSeek, "DeepSeek")?;
                let client = OpenAIClient::new(key)
                    .with_base_url(DEEPSEEK_BASE_URL)
                    .with_model(model.unwrap_or(DEEPSEEK_DEFAULT_MODEL));
                Ok(Arc::new(client))
            }
            ChatProvider::Qwen => {
                let key = self.api_key(ChatProvider::Qwen, "Qwen")?;
                let mut client = QwenClient::new(key);
                if let Some(model) = model {
                    client = client.with_model(model);
                }
                Ok(Arc::new(client))
            }
        }
    }

    fn api_key(&self, provider: ChatProvider, name: &'static str) -> Result<&str> {
        self.api_keys
            .get(&provider)
            .map(String::as_str)
            .ok_or(AiError::MissingApiKey(name))
    }
}

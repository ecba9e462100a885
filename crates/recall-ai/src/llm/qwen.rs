//! Qwen (DashScope) chat completion client

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AiError, Result};
use crate::http_client::build_http_client;
use crate::llm::client::{
    CompletionRequest, CompletionResponse, CompletionStream, LlmClient, Message, TokenUsage,
    response_to_error,
};

const DASHSCOPE_URL: &str =
    "https://dashscope.aliyuncs.com/api/v1/services/aigc/text-generation/generation";

/// Qwen client against the DashScope text-generation endpoint
#[derive(Debug)]
pub struct QwenClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl QwenClient {
    /// Create a new Qwen client
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: build_http_client(),
            api_key: api_key.into(),
            model: "qwen-max".to_string(),
            base_url: DASHSCOPE_URL.to_string(),
        }
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set custom endpoint URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn request_body(&self, request: &CompletionRequest, incremental: bool) -> QwenRequest {
        QwenRequest {
            model: self.model.clone(),
            input: QwenInput {
                messages: request
                    .messages
                    .iter()
                    .map(|m: &Message| QwenMessage {
                        role: m.role.as_str().to_string(),
                        content: m.content.clone(),
                    })
                    .collect(),
            },
            parameters: QwenParameters {
                temperature: request.temperature,
                max_tokens: request.max_tokens,
                incremental_output: incremental.then_some(true),
            },
        }
    }
}

#[derive(Serialize)]
struct QwenRequest {
    model: String,
    input: QwenInput,
    parameters: QwenParameters,
}

#[derive(Serialize)]
struct QwenInput {
    messages: Vec<QwenMessage>,
}

#[derive(Serialize)]
struct QwenMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct QwenParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    incremental_output: Option<bool>,
}

#[derive(Deserialize)]
struct QwenResponse {
    output: QwenOutput,
    usage: Option<QwenUsage>,
}

#[derive(Deserialize)]
struct QwenOutput {
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
struct QwenUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
    total_tokens: Option<u32>,
}

impl From<QwenUsage> for TokenUsage {
    fn from(usage: QwenUsage) -> Self {
        Self {
            prompt_tokens: usage.input_tokens,
            completion_tokens: usage.output_tokens,
            total_tokens: usage
                .total_tokens
                .unwrap_or(usage.input_tokens + usage.output_tokens),
        }
    }
}

#[async_trait]
impl LlmClient for QwenClient {
    fn provider(&self) -> &str {
        "qwen"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = self.request_body(&request, false);

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(response_to_error(response, "Qwen").await);
        }

        let data: QwenResponse = response.json().await?;
        let content = data
            .output
            .text
            .ok_or_else(|| AiError::Llm("No response from Qwen".to_string()))?;

        Ok(CompletionResponse {
            content,
            usage: data.usage.map(TokenUsage::from).unwrap_or_default(),
        })
    }

    fn complete_stream(&self, request: CompletionRequest) -> CompletionStream {
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let base_url = self.base_url.clone();
        let body = self.request_body(&request, true);

        Box::pin(async_stream::stream! {
            let response = match client
                .post(&base_url)
                .header("Authorization", format!("Bearer {}", api_key))
                .header("Content-Type", "application/json")
                .header("X-DashScope-SSE", "enable")
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    yield Err(AiError::Llm(format!("Request failed: {}", e)));
                    return;
                }
            };

            if !response.status().is_success() {
                yield Err(response_to_error(response, "Qwen").await);
                return;
            }

            let mut byte_stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        yield Err(AiError::Llm(format!("Stream error: {}", e)));
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(pos) = buffer.find("\n\n") {
                    let event_str = buffer[..pos].to_string();
                    buffer = buffer[pos + 2..].to_string();

                    for line in event_str.lines() {
                        if let Some(data) = line.strip_prefix("data:") {
                            let parsed: QwenResponse = match serde_json::from_str(data.trim()) {
                                Ok(p) => p,
                                Err(_) => continue,
                            };
                            if let Some(text) = parsed.output.text
                                && !text.is_empty()
                            {
                                yield Ok(text);
                            }
                        }
                    }
                }
            }
        })
    }
}

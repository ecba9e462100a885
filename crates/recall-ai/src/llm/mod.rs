//! LLM module - Multi-provider chat completion client abstraction

mod client;
mod factory;
mod openai;
mod qwen;

pub use client::{
    CompletionRequest, CompletionResponse, CompletionStream, LlmClient, Message, Role, TokenUsage,
};
pub use factory::{ChatProvider, LlmClientFactory};
pub use openai::OpenAIClient;
pub use qwen::QwenClient;

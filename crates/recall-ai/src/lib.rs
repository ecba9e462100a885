//! Recall AI - LLM provider clients and the conversation memory engine.
//!
//! Two halves:
//!
//! - [`llm`] - provider-agnostic chat completion clients (OpenAI-compatible,
//!   Qwen/DashScope) behind the [`llm::LlmClient`] trait, built through a
//!   configuration-driven [`llm::LlmClientFactory`].
//! - [`memory`] - relevance filtering, context assembly, memory writing,
//!   summarization and retention pruning on top of `recall-storage`.

pub mod error;
mod http_client;
pub mod llm;
pub mod memory;

pub use error::{AiError, Result};

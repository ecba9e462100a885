//! Chat turn orchestration.
//!
//! Per request: load (or create) the user, recall relevant memories, build
//! the provider context, complete, then persist the chat rows and derived
//! memories. The provider call is the only suspending step; everything else
//! is short-lived storage transactions.

use chrono::Utc;
use uuid::Uuid;

use crate::api::chat::{ChatRequest, ChatResponse};
use crate::api::state::AppState;
use crate::error::ApiError;
use recall_ai::llm::{ChatProvider, CompletionRequest};
use recall_ai::memory::build_context;
use recall_storage::{ChatMessageRecord, ChatRole};

pub async fn run_turn(state: &AppState, request: ChatRequest) -> Result<ChatResponse, ApiError> {
    let user = state.storage.users.get_or_create(&request.user_id)?;
    state.storage.users.touch(&request.user_id)?;

    let strategy = state.config.recall_strategy;
    let memories = state
        .engine
        .relevant_memories(&request.user_id, &request.message, strategy)?;
    let memory_injected = !memories.is_empty();

    let context = build_context(
        &user,
        &request.message,
        &memories,
        strategy,
        Some(state.config.max_context_tokens),
    );

    let provider = request
        .provider
        .as_deref()
        .map(str::parse::<ChatProvider>)
        .transpose()?;
    let client = state.llm.create(provider, request.model.as_deref())?;

    tracing::debug!(
        user_id = %request.user_id,
        provider = client.provider(),
        model = client.model(),
        memories = memories.len(),
        "dispatching chat completion"
    );

    let completion = client
        .complete(
            CompletionRequest::new(context)
                .with_temperature(request.temperature)
                .with_max_tokens(request.max_tokens),
        )
        .await?;

    let user_message = ChatMessageRecord::new(&request.user_id, ChatRole::User, &request.message, 0);
    let assistant_message = ChatMessageRecord::new(
        &request.user_id,
        ChatRole::Assistant,
        &completion.content,
        completion.usage.total_tokens,
    );
    state
        .storage
        .chat
        .insert_turn_pair(&user_message, &assistant_message)?;

    state.engine.record_turn(
        &request.user_id,
        &request.message,
        &completion.content,
        state.config.importance_policy,
    )?;
    state.storage.users.bump_message_count(&request.user_id)?;

    Ok(ChatResponse {
        id: Uuid::new_v4().to_string(),
        user_id: request.user_id,
        message: completion.content,
        timestamp: Utc::now().to_rfc3339(),
        tokens_used: completion.usage.total_tokens,
        memory_injected,
    })
}

//! Context assembly - turns profile, preferences and recalled memories into
//! the ordered message sequence sent to the provider.

use crate::llm::Message;
use crate::memory::recall::RecallStrategy;
use recall_storage::{MemoryRecord, UserProfile, UserRecord};

const MEMORY_BLOCK_HEADER: &str = "Relevant context from previous conversations:";
const DEFAULT_TOPIC: &str = "General";

/// Build the provider context for one chat turn.
///
/// Order: one merged system turn (static prompt + preferences), then the
/// recalled memories (shape depends on the strategy), then the raw query as
/// the user turn. Steps whose source is empty are skipped entirely.
///
/// `max_tokens` is accepted for symmetry with the provider request but the
/// assembled turns are not measured against it.
/// TODO: count tokens and trim the memory turns once a tokenizer is wired in.
pub fn build_context(
    user: &UserRecord,
    query: &str,
    memories: &[MemoryRecord],
    strategy: RecallStrategy,
    _max_tokens: Option<u32>,
) -> Vec<Message> {
    let mut context = Vec::new();

    if let Some(system) = leading_system_turn(user) {
        context.push(Message::system(system));
    }

    match strategy {
        RecallStrategy::KeywordOverlap => {
            for memory in memories {
                context.push(Message::system(format_memory(memory)));
            }
        }
        RecallStrategy::Recency => {
            if !memories.is_empty() {
                let joined = memories
                    .iter()
                    .map(|m| m.content.as_str())
                    .collect::<Vec<_>>()
                    .join("\n");
                context.push(Message::system(format!("{MEMORY_BLOCK_HEADER}\n{joined}")));
            }
        }
    }

    context.push(Message::user(query));
    context
}

/// Merge the static system prompt and the derived preferences block into at
/// most one system turn.
fn leading_system_turn(user: &UserRecord) -> Option<String> {
    let prompt = user
        .system_prompt
        .as_deref()
        .filter(|p| !p.trim().is_empty());
    let preferences = preferences_block(&user.profile);

    match (prompt, preferences) {
        (Some(prompt), Some(preferences)) => Some(format!("{prompt}\n\n{preferences}")),
        (Some(prompt), None) => Some(prompt.to_string()),
        (None, Some(preferences)) => Some(preferences),
        (None, None) => None,
    }
}

fn preferences_block(profile: &UserProfile) -> Option<String> {
    let mut lines = String::new();
    if let Some(language) = &profile.language {
        lines.push_str(&format!("- Language: {language}\n"));
    }
    if let Some(tone) = &profile.tone_preference {
        lines.push_str(&format!("- Tone: {tone}\n"));
    }
    if let Some(instructions) = &profile.custom_instructions {
        lines.push_str(&format!("- Instructions: {instructions}\n"));
    }

    if lines.is_empty() {
        None
    } else {
        Some(format!("User preferences:\n{lines}"))
    }
}

fn format_memory(memory: &MemoryRecord) -> String {
    let topic = memory.topic.as_deref().unwrap_or(DEFAULT_TOPIC);
    format!(
        "[{}] {}: {}",
        memory.memory_type.as_str().to_uppercase(),
        topic,
        memory.content
    )
}

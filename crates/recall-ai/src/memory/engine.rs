//! Memory engine - the read/write surface the chat service drives.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::error::Result;
use crate::memory::importance::ImportancePolicy;
use crate::memory::recall::{
    CANDIDATE_POOL_SIZE, RECENCY_LIMIT, RECENCY_WINDOW_DAYS, RecallStrategy, filter_by_overlap,
};
use recall_storage::{MemoryRecord, MemoryType, Storage};

/// Retention horizon used when the caller does not supply one.
pub const DEFAULT_RETENTION_DAYS: i64 = 30;
/// Importance threshold for the conditional prune variant.
pub const DEFAULT_MIN_IMPORTANCE: u8 = 3;

const SUMMARY_IMPORTANCE: u8 = 7;
const SUMMARY_HISTORY_LIMIT: usize = 10;
const SUMMARY_SNIPPET_CHARS: usize = 100;
const SUMMARY_TOPIC: &str = "Conversation Summary";
const TOPIC_WORD_LIMIT: usize = 5;
const DEFAULT_TOPIC: &str = "General";

pub struct MemoryEngine {
    storage: Arc<Storage>,
}

impl MemoryEngine {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Select the memories worth injecting for this turn.
    pub fn relevant_memories(
        &self,
        user_id: &str,
        query: &str,
        strategy: RecallStrategy,
    ) -> Result<Vec<MemoryRecord>> {
        let memories = match strategy {
            RecallStrategy::Recency => {
                let cutoff = Utc::now() - Duration::days(RECENCY_WINDOW_DAYS);
                let mut recent = self.storage.memories.list_for_user(user_id)?;
                recent.retain(|memory| memory.created_at >= cutoff);
                recent.truncate(RECENCY_LIMIT);
                recent
            }
            RecallStrategy::KeywordOverlap => {
                let pool = self
                    .storage
                    .memories
                    .top_for_user(user_id, CANDIDATE_POOL_SIZE)?;
                filter_by_overlap(query, &pool)
            }
        };

        tracing::debug!(
            user_id,
            strategy = strategy.as_str(),
            count = memories.len(),
            "selected relevant memories"
        );
        Ok(memories)
    }

    /// Append both halves of a completed exchange as short-term memories.
    ///
    /// The two records are committed in one storage transaction; a failure
    /// leaves neither behind.
    pub fn record_turn(
        &self,
        user_id: &str,
        user_message: &str,
        assistant_reply: &str,
        policy: ImportancePolicy,
    ) -> Result<()> {
        let user_memory = MemoryRecord::new(
            user_id,
            MemoryType::ShortTerm,
            user_message,
            policy.score(user_message),
            Some(extract_topic(user_message)),
            vec!["conversation".to_string(), "user_input".to_string()],
        );
        let assistant_memory = MemoryRecord::new(
            user_id,
            MemoryType::ShortTerm,
            assistant_reply,
            policy.score(assistant_reply),
            Some(extract_topic(assistant_reply)),
            vec!["conversation".to_string(), "assistant_response".to_string()],
        );

        self.storage
            .memories
            .insert_turn_pair(&user_memory, &assistant_memory)?;
        Ok(())
    }

    /// Concatenation-based summary of the user's recent history, stored as a
    /// summary memory. Returns `None` when there is nothing to summarize.
    pub fn summarize_conversation(&self, user_id: &str) -> Result<Option<String>> {
        let history = self
            .storage
            .chat
            .recent_for_user(user_id, SUMMARY_HISTORY_LIMIT)?;
        if history.is_empty() {
            return Ok(None);
        }

        let summary = history
            .iter()
            .map(|message| {
                let snippet: String = message.content.chars().take(SUMMARY_SNIPPET_CHARS).collect();
                format!("{}: {}", message.role.as_str().to_uppercase(), snippet)
            })
            .collect::<Vec<_>>()
            .join(" | ");

        let record = MemoryRecord::new(
            user_id,
            MemoryType::Summary,
            summary.clone(),
            SUMMARY_IMPORTANCE,
            Some(SUMMARY_TOPIC.to_string()),
            vec!["summary".to_string(), "long_term".to_string()],
        );
        self.storage.memories.insert(&record)?;

        Ok(Some(summary))
    }

    /// Unconditional retention prune. Returns the number of rows removed.
    pub fn prune(&self, user_id: &str, retention_days: i64) -> Result<usize> {
        Ok(self
            .storage
            .memories
            .prune_older_than(user_id, retention_days)?)
    }

    /// Importance-aware retention prune. Returns the number of rows removed.
    pub fn prune_below_importance(
        &self,
        user_id: &str,
        retention_days: i64,
        min_importance: u8,
    ) -> Result<usize> {
        Ok(self
            .storage
            .memories
            .prune_below_importance(user_id, retention_days, min_importance)?)
    }
}

/// First few words of the text, as a cheap topic label.
fn extract_topic(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().take(TOPIC_WORD_LIMIT).collect();
    if words.is_empty() {
        DEFAULT_TOPIC.to_string()
    } else {
        words.join(" ")
    }
}

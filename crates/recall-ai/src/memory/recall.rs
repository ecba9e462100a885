//! Relevance filtering strategies for stored memories.
//!
//! Two policies coexist: a date-bounded recency scan and a keyword-overlap
//! filter over a candidate pool. Which one runs is a deployment choice, not
//! a per-request one.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AiError;
use recall_storage::MemoryRecord;

/// How far back the recency policy looks.
pub const RECENCY_WINDOW_DAYS: i64 = 30;
/// Maximum memories the recency policy returns.
pub const RECENCY_LIMIT: usize = 10;
/// Candidate pool size handed to the keyword-overlap filter.
pub const CANDIDATE_POOL_SIZE: usize = 20;

/// Only the first 10 whitespace tokens on each side participate in matching.
const OVERLAP_TOKEN_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecallStrategy {
    #[default]
    Recency,
    KeywordOverlap,
}

impl RecallStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recency => "recency",
            Self::KeywordOverlap => "keyword_overlap",
        }
    }
}

impl FromStr for RecallStrategy {
    type Err = AiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "recency" => Ok(Self::Recency),
            "keyword_overlap" => Ok(Self::KeywordOverlap),
            other => Err(AiError::Llm(format!("Unknown recall strategy '{other}'"))),
        }
    }
}

/// Symmetric substring test between a message and a memory's content.
///
/// A memory matches if any of the first 10 lower-cased tokens of the query
/// appear as substrings of the lower-cased content, or any of the first 10
/// tokens of the content appear in the query. Substring (not whole-word)
/// matching is intentional; short tokens can and do produce false positives.
pub fn keyword_overlap(query: &str, content: &str) -> bool {
    let query = query.to_lowercase();
    let content = content.to_lowercase();

    query
        .split_whitespace()
        .take(OVERLAP_TOKEN_LIMIT)
        .any(|word| content.contains(word))
        || content
            .split_whitespace()
            .take(OVERLAP_TOKEN_LIMIT)
            .any(|word| query.contains(word))
}

/// Keep the candidates that overlap with the query, preserving the pool's
/// incoming order. A stable filter: no re-ranking.
pub fn filter_by_overlap(query: &str, pool: &[MemoryRecord]) -> Vec<MemoryRecord> {
    pool.iter()
        .filter(|memory| keyword_overlap(query, &memory.content))
        .cloned()
        .collect()
}

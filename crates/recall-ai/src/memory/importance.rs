//! Importance scoring for newly written memories.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AiError;
use recall_storage::memory::MAX_IMPORTANCE;

/// Score assigned when no heuristic runs.
pub const DEFAULT_IMPORTANCE: u8 = 5;

/// Keywords that signal a memory worth keeping around.
const IMPORTANCE_KEYWORDS: [&str; 6] =
    ["important", "remember", "critical", "essential", "key", "crucial"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportancePolicy {
    /// Every conversation memory gets the flat default score.
    Flat,
    /// Length and keyword heuristics on the memory text.
    #[default]
    Weighted,
}

impl ImportancePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Weighted => "weighted",
        }
    }

    pub fn score(&self, text: &str) -> u8 {
        match self {
            Self::Flat => DEFAULT_IMPORTANCE,
            Self::Weighted => score_importance(text),
        }
    }
}

impl FromStr for ImportancePolicy {
    type Err = AiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "flat" => Ok(Self::Flat),
            "weighted" => Ok(Self::Weighted),
            other => Err(AiError::Llm(format!("Unknown importance policy '{other}'"))),
        }
    }
}

/// Deterministic importance heuristic.
///
/// Base 5, +1 for texts over 100 characters, +1 more over 500, +1 per
/// distinct importance keyword present, capped at 10. Base and increments
/// are non-negative so no floor clamp is needed.
pub fn score_importance(text: &str) -> u8 {
    let mut score = DEFAULT_IMPORTANCE;

    let length = text.chars().count();
    if length > 100 {
        score += 1;
    }
    if length > 500 {
        score += 1;
    }

    let lowered = text.to_lowercase();
    for keyword in IMPORTANCE_KEYWORDS {
        if lowered.contains(keyword) {
            score += 1;
        }
    }

    score.min(MAX_IMPORTANCE)
}

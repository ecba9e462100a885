//! Memory system - recall, context assembly, writing and pruning
//!
//! Per chat turn: the recall strategy picks which stored memories matter for
//! the incoming message, the context assembler folds them into the system
//! prompt, and after the provider replies the engine appends both halves of
//! the exchange as new memories.

mod context;
mod engine;
mod importance;
mod recall;

pub use context::build_context;
pub use engine::{DEFAULT_MIN_IMPORTANCE, DEFAULT_RETENTION_DAYS, MemoryEngine};
pub use importance::{DEFAULT_IMPORTANCE, ImportancePolicy, score_importance};
pub use recall::{
    CANDIDATE_POOL_SIZE, RECENCY_LIMIT, RECENCY_WINDOW_DAYS, RecallStrategy, filter_by_overlap,
    keyword_overlap,
};

//! Memory storage - persistence for conversation-derived memory snippets.
//!
//! # Tables
//!
//! - `memories`: memory_id -> memory record (JSON)
//! - `memory_user_index`: user_id:memory_id -> memory_id (for listing by user)

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

const MEMORY_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("memories");
/// Index: user_id:memory_id -> memory_id
const USER_INDEX_TABLE: TableDefinition<&str, &str> = TableDefinition::new("memory_user_index");

/// Importance scores are always kept within [0, MAX_IMPORTANCE].
pub const MAX_IMPORTANCE: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    ShortTerm,
    LongTerm,
    Summary,
}

impl MemoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShortTerm => "short_term",
            Self::LongTerm => "long_term",
            Self::Summary => "summary",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    pub user_id: String,
    pub memory_type: MemoryType,
    pub content: String,
    /// Retention priority, clamped to [0, 10] at construction.
    pub importance: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MemoryRecord {
    pub fn new(
        user_id: impl Into<String>,
        memory_type: MemoryType,
        content: impl Into<String>,
        importance: u8,
        topic: Option<String>,
        tags: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            memory_type,
            content: content.into(),
            importance: importance.min(MAX_IMPORTANCE),
            topic,
            tags,
            created_at: now,
            updated_at: now,
        }
    }
}

pub struct MemoryStorage {
    db: Arc<Database>,
}

impl MemoryStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(MEMORY_TABLE)?;
        write_txn.open_table(USER_INDEX_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Insert a single memory record and its user index entry.
    pub fn insert(&self, record: &MemoryRecord) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(MEMORY_TABLE)?;
            let mut index = write_txn.open_table(USER_INDEX_TABLE)?;

            if record.content.trim().is_empty() {
                anyhow::bail!("memory content must not be empty");
            }
            let json_bytes = serde_json::to_vec(record)?;
            table.insert(record.id.as_str(), json_bytes.as_slice())?;
            let index_key = format!("{}:{}", record.user_id, record.id);
            index.insert(index_key.as_str(), record.id.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Insert both halves of a completed exchange in one transaction.
    ///
    /// If either record fails validation or insertion, the transaction is
    /// dropped without committing and neither record is persisted.
    pub fn insert_turn_pair(&self, first: &MemoryRecord, second: &MemoryRecord) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(MEMORY_TABLE)?;
            let mut index = write_txn.open_table(USER_INDEX_TABLE)?;

            for record in [first, second] {
                if record.content.trim().is_empty() {
                    anyhow::bail!("memory content must not be empty");
                }
                let json_bytes = serde_json::to_vec(record)?;
                table.insert(record.id.as_str(), json_bytes.as_slice())?;
                let index_key = format!("{}:{}", record.user_id, record.id);
                index.insert(index_key.as_str(), record.id.as_str())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// All memories for a user, newest first.
    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<MemoryRecord>> {
        let mut records = self.collect_for_user(user_id)?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    /// Candidate pool for relevance filtering: ordered by importance
    /// descending, then by creation time descending, capped at `limit`.
    pub fn top_for_user(&self, user_id: &str, limit: usize) -> Result<Vec<MemoryRecord>> {
        let mut records = self.collect_for_user(user_id)?;
        records.sort_by(|a, b| {
            b.importance
                .cmp(&a.importance)
                .then(b.created_at.cmp(&a.created_at))
        });
        records.truncate(limit);
        Ok(records)
    }

    pub fn count_for_user(&self, user_id: &str) -> Result<usize> {
        Ok(self.collect_for_user(user_id)?.len())
    }

    /// Delete every memory older than the retention horizon, regardless of
    /// importance. Returns the number of rows removed.
    ///
    /// The cutoff comparison is strict: a record created exactly at the
    /// cutoff instant is retained.
    pub fn prune_older_than(&self, user_id: &str, retention_days: i64) -> Result<usize> {
        let cutoff = Utc::now() - Duration::days(retention_days);
        self.prune_matching(user_id, |record| record.created_at < cutoff)
    }

    /// Delete memories that are both older than the retention horizon and
    /// below the importance threshold. Returns the number of rows removed.
    pub fn prune_below_importance(
        &self,
        user_id: &str,
        retention_days: i64,
        min_importance: u8,
    ) -> Result<usize> {
        let cutoff = Utc::now() - Duration::days(retention_days);
        self.prune_matching(user_id, |record| {
            record.created_at < cutoff && record.importance < min_importance
        })
    }

    fn prune_matching(
        &self,
        user_id: &str,
        should_delete: impl Fn(&MemoryRecord) -> bool,
    ) -> Result<usize> {
        let write_txn = self.db.begin_write()?;
        let deleted = {
            let mut table = write_txn.open_table(MEMORY_TABLE)?;
            let mut index = write_txn.open_table(USER_INDEX_TABLE)?;

            let prefix = format!("{}:", user_id);
            let mut doomed = Vec::new();

            for item in index.iter()? {
                let (key, value) = item?;
                if !key.value().starts_with(&prefix) {
                    continue;
                }
                let memory_id = value.value().to_string();
                if let Some(data) = table.get(memory_id.as_str())? {
                    let record: MemoryRecord = serde_json::from_slice(data.value())?;
                    if should_delete(&record) {
                        doomed.push(memory_id);
                    }
                }
            }

            for memory_id in &doomed {
                table.remove(memory_id.as_str())?;
                let index_key = format!("{}{}", prefix, memory_id);
                index.remove(index_key.as_str())?;
            }

            doomed.len()
        };
        write_txn.commit()?;

        if deleted > 0 {
            tracing::debug!(user_id, deleted, "pruned memories");
        }
        Ok(deleted)
    }

    fn collect_for_user(&self, user_id: &str) -> Result<Vec<MemoryRecord>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(USER_INDEX_TABLE)?;
        let table = read_txn.open_table(MEMORY_TABLE)?;

        let prefix = format!("{}:", user_id);
        let mut records = Vec::new();

        for item in index.iter()? {
            let (key, value) = item?;
            if !key.value().starts_with(&prefix) {
                continue;
            }
            if let Some(data) = table.get(value.value())? {
                let record: MemoryRecord = serde_json::from_slice(data.value())?;
                records.push(record);
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn setup() -> (MemoryStorage, tempfile::TempDir) {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(Database::create(db_path).unwrap());
        (MemoryStorage::new(db).unwrap(), temp_dir)
    }

    fn memory(user_id: &str, content: &str, importance: u8, age_days: i64) -> MemoryRecord {
        let mut record = MemoryRecord::new(
            user_id,
            MemoryType::ShortTerm,
            content,
            importance,
            None,
            vec!["conversation".to_string()],
        );
        record.created_at = Utc::now() - Duration::days(age_days);
        record
    }

    #[test]
    fn test_importance_is_clamped() {
        let record = MemoryRecord::new("u", MemoryType::ShortTerm, "x", 99, None, vec![]);
        assert_eq!(record.importance, MAX_IMPORTANCE);
    }

    #[test]
    fn test_list_is_newest_first() {
        let (storage, _temp_dir) = setup();

        storage.insert(&memory("alice", "oldest", 5, 3)).unwrap();
        storage.insert(&memory("alice", "newest", 5, 0)).unwrap();
        storage.insert(&memory("alice", "middle", 5, 1)).unwrap();
        storage.insert(&memory("bob", "other user", 5, 0)).unwrap();

        let records = storage.list_for_user("alice").unwrap();
        let contents: Vec<&str> = records.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["newest", "middle", "oldest"]);
    }

    #[test]
    fn test_top_orders_by_importance_then_recency() {
        let (storage, _temp_dir) = setup();

        storage.insert(&memory("alice", "low", 2, 0)).unwrap();
        storage.insert(&memory("alice", "high-old", 8, 5)).unwrap();
        storage.insert(&memory("alice", "high-new", 8, 1)).unwrap();

        let records = storage.top_for_user("alice", 2).unwrap();
        let contents: Vec<&str> = records.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["high-new", "high-old"]);
    }

    #[test]
    fn test_turn_pair_is_all_or_nothing() {
        let (storage, _temp_dir) = setup();

        let valid = memory("alice", "user said something", 5, 0);
        let invalid = memory("alice", "   ", 5, 0);

        let result = storage.insert_turn_pair(&valid, &invalid);
        assert!(result.is_err());
        assert_eq!(storage.count_for_user("alice").unwrap(), 0);

        let reply = memory("alice", "assistant replied", 5, 0);
        storage.insert_turn_pair(&valid, &reply).unwrap();
        assert_eq!(storage.count_for_user("alice").unwrap(), 2);
    }

    #[test]
    fn test_unconditional_prune_ignores_importance() {
        let (storage, _temp_dir) = setup();

        storage.insert(&memory("alice", "old important", 10, 31)).unwrap();
        storage.insert(&memory("alice", "old trivial", 1, 31)).unwrap();
        storage.insert(&memory("alice", "recent", 1, 29)).unwrap();

        let deleted = storage.prune_older_than("alice", 30).unwrap();
        assert_eq!(deleted, 2);

        let remaining = storage.list_for_user("alice").unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].content, "recent");

        // Idempotent: nothing newly expired.
        assert_eq!(storage.prune_older_than("alice", 30).unwrap(), 0);
    }

    #[test]
    fn test_conditional_prune_requires_age_and_low_importance() {
        let (storage, _temp_dir) = setup();

        storage.insert(&memory("alice", "old important", 8, 40)).unwrap();
        storage.insert(&memory("alice", "old trivial", 2, 40)).unwrap();
        storage.insert(&memory("alice", "recent trivial", 2, 5)).unwrap();

        let deleted = storage.prune_below_importance("alice", 30, 3).unwrap();
        assert_eq!(deleted, 1);

        let contents: Vec<String> = storage
            .list_for_user("alice")
            .unwrap()
            .into_iter()
            .map(|r| r.content)
            .collect();
        assert!(contents.contains(&"old important".to_string()));
        assert!(contents.contains(&"recent trivial".to_string()));
        assert!(!contents.contains(&"old trivial".to_string()));
    }

    #[test]
    fn test_prune_is_scoped_to_user() {
        let (storage, _temp_dir) = setup();

        storage.insert(&memory("alice", "old", 1, 40)).unwrap();
        storage.insert(&memory("bob", "also old", 1, 40)).unwrap();

        let deleted = storage.prune_older_than("alice", 30).unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(storage.count_for_user("bob").unwrap(), 1);
    }
}

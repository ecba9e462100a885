//! Chat message storage - append-only per-user conversation log.
//!
//! # Tables
//!
//! - `chat_messages`: message_id -> chat message record (JSON)
//! - `chat_user_index`: user_id:message_id -> message_id

use anyhow::Result;
use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

const CHAT_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("chat_messages");
/// Index: user_id:message_id -> message_id
const CHAT_USER_INDEX_TABLE: TableDefinition<&str, &str> = TableDefinition::new("chat_user_index");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageRecord {
    pub id: String,
    pub user_id: String,
    pub role: ChatRole,
    pub content: String,
    /// Total tokens consumed producing this message; 0 for user turns.
    #[serde(default)]
    pub tokens_used: u32,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessageRecord {
    pub fn new(
        user_id: impl Into<String>,
        role: ChatRole,
        content: impl Into<String>,
        tokens_used: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            role,
            content: content.into(),
            tokens_used,
            timestamp: Utc::now(),
        }
    }
}

pub struct ChatStorage {
    db: Arc<Database>,
}

impl ChatStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(CHAT_TABLE)?;
        write_txn.open_table(CHAT_USER_INDEX_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Append the user turn and the assistant reply in one transaction.
    pub fn insert_turn_pair(
        &self,
        user_message: &ChatMessageRecord,
        assistant_message: &ChatMessageRecord,
    ) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CHAT_TABLE)?;
            let mut index = write_txn.open_table(CHAT_USER_INDEX_TABLE)?;

            for record in [user_message, assistant_message] {
                let json_bytes = serde_json::to_vec(record)?;
                table.insert(record.id.as_str(), json_bytes.as_slice())?;
                let index_key = format!("{}:{}", record.user_id, record.id);
                index.insert(index_key.as_str(), record.id.as_str())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// The most recent `limit` messages for a user, oldest first.
    pub fn recent_for_user(&self, user_id: &str, limit: usize) -> Result<Vec<ChatMessageRecord>> {
        let mut records = self.collect_for_user(user_id)?;
        records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        if records.len() > limit {
            records.drain(..records.len() - limit);
        }
        Ok(records)
    }

    pub fn count_for_user(&self, user_id: &str) -> Result<usize> {
        Ok(self.collect_for_user(user_id)?.len())
    }

    fn collect_for_user(&self, user_id: &str) -> Result<Vec<ChatMessageRecord>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(CHAT_USER_INDEX_TABLE)?;
        let table = read_txn.open_table(CHAT_TABLE)?;

        let prefix = format!("{}:", user_id);
        let mut records = Vec::new();

        for item in index.iter()? {
            let (key, value) = item?;
            if !key.value().starts_with(&prefix) {
                continue;
            }
            if let Some(data) = table.get(value.value())? {
                let record: ChatMessageRecord = serde_json::from_slice(data.value())?;
                records.push(record);
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    fn setup() -> (ChatStorage, tempfile::TempDir) {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(Database::create(db_path).unwrap());
        (ChatStorage::new(db).unwrap(), temp_dir)
    }

    fn message(user_id: &str, role: ChatRole, content: &str, age_minutes: i64) -> ChatMessageRecord {
        let mut record = ChatMessageRecord::new(user_id, role, content, 0);
        record.timestamp = Utc::now() - Duration::minutes(age_minutes);
        record
    }

    #[test]
    fn test_turn_pair_persists_both_rows() {
        let (storage, _temp_dir) = setup();

        let user = ChatMessageRecord::new("alice", ChatRole::User, "Hi", 0);
        let assistant = ChatMessageRecord::new("alice", ChatRole::Assistant, "Hello!", 42);
        storage.insert_turn_pair(&user, &assistant).unwrap();

        let records = storage.recent_for_user("alice", 10).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].role, ChatRole::User);
        assert_eq!(records[1].role, ChatRole::Assistant);
        assert_eq!(records[1].tokens_used, 42);
    }

    #[test]
    fn test_recent_is_chronological_and_capped() {
        let (storage, _temp_dir) = setup();

        storage
            .insert_turn_pair(
                &message("alice", ChatRole::User, "first", 30),
                &message("alice", ChatRole::Assistant, "second", 29),
            )
            .unwrap();
        storage
            .insert_turn_pair(
                &message("alice", ChatRole::User, "third", 10),
                &message("alice", ChatRole::Assistant, "fourth", 9),
            )
            .unwrap();

        let recent = storage.recent_for_user("alice", 2).unwrap();
        let contents: Vec<&str> = recent.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["third", "fourth"]);
    }

    #[test]
    fn test_history_is_scoped_to_user() {
        let (storage, _temp_dir) = setup();

        storage
            .insert_turn_pair(
                &message("alice", ChatRole::User, "hers", 1),
                &message("alice", ChatRole::Assistant, "reply", 0),
            )
            .unwrap();

        assert_eq!(storage.count_for_user("bob").unwrap(), 0);
        assert_eq!(storage.count_for_user("alice").unwrap(), 2);
    }
}

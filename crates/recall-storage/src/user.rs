//! User storage - profile, preferences and activity bookkeeping per user.

use anyhow::Result;
use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, TableDefinition};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

const USERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Recognized profile keys. Anything else a client sends is rejected by the
/// request schema before it reaches this layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone_preference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    /// Opaque client-facing key. Unique; doubles as the storage key.
    pub user_id: String,
    #[serde(default)]
    pub profile: UserProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub message_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            profile: UserProfile::default(),
            system_prompt: None,
            message_count: 0,
            created_at: now,
            updated_at: now,
            last_active: now,
        }
    }
}

pub struct UserStorage {
    db: Arc<Database>,
}

impl UserStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(USERS_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Get a user by their client-facing key.
    pub fn get(&self, user_id: &str) -> Result<Option<UserRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS_TABLE)?;

        if let Some(data) = table.get(user_id)? {
            let record: UserRecord = serde_json::from_slice(data.value())?;
            Ok(Some(record))
        } else {
            Ok(None)
        }
    }

    /// Insert or replace a user record.
    pub fn put(&self, record: &UserRecord) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(USERS_TABLE)?;
            let json_bytes = serde_json::to_vec(record)?;
            table.insert(record.user_id.as_str(), json_bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Fetch the user, creating a fresh record on first contact.
    pub fn get_or_create(&self, user_id: &str) -> Result<UserRecord> {
        if let Some(existing) = self.get(user_id)? {
            return Ok(existing);
        }
        let record = UserRecord::new(user_id);
        self.put(&record)?;
        tracing::debug!(user_id, "created user on first contact");
        Ok(record)
    }

    /// Refresh the activity timestamp without touching anything else.
    pub fn touch(&self, user_id: &str) -> Result<()> {
        if let Some(mut record) = self.get(user_id)? {
            record.last_active = Utc::now();
            self.put(&record)?;
        }
        Ok(())
    }

    /// Increment the per-user turn counter after a completed exchange.
    pub fn bump_message_count(&self, user_id: &str) -> Result<()> {
        if let Some(mut record) = self.get(user_id)? {
            record.message_count += 1;
            record.last_active = Utc::now();
            self.put(&record)?;
        }
        Ok(())
    }
}

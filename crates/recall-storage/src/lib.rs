//! Recall Storage - persistence layer for the chat-memory middleware
//!
//! This crate owns the durable state of the service, using redb as the
//! embedded database. Records are serialized as JSON bytes; secondary
//! lookup is done through per-user index tables.
//!
//! # Tables
//!
//! - `users` - user_id -> user record
//! - `memories` - memory_id -> memory record
//! - `memory_user_index` - user_id:memory_id -> memory_id
//! - `chat_messages` - message_id -> chat message record
//! - `chat_user_index` - user_id:message_id -> message_id

pub mod chat;
pub mod memory;
pub mod paths;
pub mod user;

use anyhow::Result;
use redb::Database;
use std::sync::Arc;

pub use chat::{ChatMessageRecord, ChatRole, ChatStorage};
pub use memory::{MemoryRecord, MemoryStorage, MemoryType};
pub use user::{UserProfile, UserRecord, UserStorage};

/// Central storage manager that initializes all storage subsystems
pub struct Storage {
    db: Arc<Database>,
    pub users: UserStorage,
    pub memories: MemoryStorage,
    pub chat: ChatStorage,
}

impl Storage {
    pub fn new(path: &str) -> Result<Self> {
        let db = Arc::new(Database::create(path)?);

        let users = UserStorage::new(db.clone())?;
        let memories = MemoryStorage::new(db.clone())?;
        let chat = ChatStorage::new(db.clone())?;

        Ok(Self {
            db,
            users,
            memories,
            chat,
        })
    }

    pub fn get_db(&self) -> Arc<Database> {
        self.db.clone()
    }
}

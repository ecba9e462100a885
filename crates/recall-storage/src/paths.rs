//! Path utilities for Recall directory resolution.

use anyhow::Result;
use std::path::PathBuf;

const RECALL_DIR: &str = ".recall";
const DATABASE_FILE: &str = "recall.db";

/// Environment variable to override the Recall directory.
const RECALL_DIR_ENV: &str = "RECALL_DIR";

/// Resolve the Recall data directory.
/// Priority: RECALL_DIR env var > ~/.recall/
pub fn resolve_recall_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(RECALL_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|h| h.join(RECALL_DIR))
        .ok_or_else(|| anyhow::anyhow!("Failed to determine home directory"))
}

/// Ensure the Recall directory exists and return its path.
pub fn ensure_recall_dir() -> Result<PathBuf> {
    let dir = resolve_recall_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Ensure the database parent directory exists and return the database path
/// as a string suitable for `Storage::new`.
pub fn ensure_database_path_string() -> Result<String> {
    let path = ensure_recall_dir()?.join(DATABASE_FILE);
    path.to_str()
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("Database path is not valid UTF-8"))
}

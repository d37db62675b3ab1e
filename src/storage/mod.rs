//! Storage module for persisting harvested accounts
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Deduplicating account upserts with the new/old freshness marker
//! - Segment counts and exports
//! - Crawl run tracking

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{AudienceStore, StorageError, StorageResult};

use crate::AudienceError;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Store handle shared between a crawl run and export requests
///
/// The mutex serializes access so that only one logical operation touches the
/// database at a time.
pub type SharedStore = Arc<Mutex<SqliteStore>>;

/// Opens (or creates) the audience database and wraps it for sharing
pub fn open_shared(path: &Path) -> Result<SharedStore, AudienceError> {
    Ok(Arc::new(Mutex::new(SqliteStore::new(path)?)))
}

/// Locks a shared store for one logical operation
pub fn lock_store(store: &SharedStore) -> Result<MutexGuard<'_, SqliteStore>, AudienceError> {
    store.lock().map_err(|_| AudienceError::LockPoisoned)
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub target_count: u64,
    pub accounts_inserted: u64,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

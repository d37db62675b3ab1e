//! Storage traits and error types
//!
//! This module defines the trait interface for audience storage backends and
//! associated error types.

use crate::audience::{AccountId, AccountRecord, Segment, Sex};
use crate::storage::{RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for audience storage backends
///
/// Account sex and status can only change through `upsert_new` and
/// `age_out_new`. Every mutating call is applied as a single transaction, so a
/// reader never observes a half-applied batch.
pub trait AudienceStore {
    // ===== Run Management =====

    /// Records the start of a crawl run and returns its id
    fn begin_run(&mut self, config_hash: &str, target_count: usize) -> StorageResult<i64>;

    /// Records the end of a crawl run
    fn finish_run(&mut self, run_id: i64, status: RunStatus, inserted: u64) -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    // ===== Accounts =====

    /// Inserts each account with status `new`
    ///
    /// Accounts whose id is already stored are left untouched, whatever their
    /// status. Returns the number of rows actually inserted.
    fn upsert_new(&mut self, records: &[(AccountId, Sex)]) -> StorageResult<usize>;

    /// Moves every `new` account to `old`
    ///
    /// Returns the number of accounts transitioned.
    fn age_out_new(&mut self) -> StorageResult<usize>;

    /// Gets a stored account by id
    fn get_account(&self, id: AccountId) -> StorageResult<Option<AccountRecord>>;

    // ===== Segments =====

    /// Counts the accounts in a segment
    fn count(&self, segment: Segment) -> StorageResult<u64>;

    /// Lists the ids in a segment in first-seen order
    fn export_segment(&self, segment: Segment) -> StorageResult<Vec<AccountId>>;
}

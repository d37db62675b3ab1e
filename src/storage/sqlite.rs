//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the AudienceStore trait.

use crate::audience::{AccountId, AccountRecord, Segment, Sex, Status};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{AudienceStore, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use crate::AudienceError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
///
/// Holds one long-lived connection; each logical operation runs in its own
/// transaction.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(AudienceError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, AudienceError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, AudienceError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
        Ok(RunRecord {
            id: row.get(0)?,
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            config_hash: row.get(3)?,
            status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
                .unwrap_or(RunStatus::Failed),
            target_count: row.get::<_, i64>(5)? as u64,
            accounts_inserted: row.get::<_, i64>(6)? as u64,
        })
    }
}

impl AudienceStore for SqliteStore {
    // ===== Run Management =====

    fn begin_run(&mut self, config_hash: &str, target_count: usize) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status, target_count) VALUES (?1, ?2, ?3, ?4)",
            params![
                now,
                config_hash,
                RunStatus::Running.to_db_string(),
                target_count as i64
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus, inserted: u64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, accounts_inserted = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, inserted as i64, run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status, target_count, accounts_inserted
                 FROM runs WHERE id = ?1",
                params![run_id],
                Self::run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status, target_count, accounts_inserted
                 FROM runs ORDER BY id DESC LIMIT 1",
                [],
                Self::run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    // ===== Accounts =====

    fn upsert_new(&mut self, records: &[(AccountId, Sex)]) -> StorageResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        let mut inserted = 0;

        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR IGNORE INTO accounts (vk_id, sex, status, first_seen_at) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (id, sex) in records {
                inserted += stmt.execute(params![
                    id.get(),
                    sex.code(),
                    Status::New.to_db_string(),
                    now
                ])?;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    fn age_out_new(&mut self) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        let changed = tx.execute(
            "UPDATE accounts SET status = ?1 WHERE status = ?2",
            params![Status::Old.to_db_string(), Status::New.to_db_string()],
        )?;
        tx.commit()?;
        Ok(changed)
    }

    fn get_account(&self, id: AccountId) -> StorageResult<Option<AccountRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT vk_id, sex, status, first_seen_at FROM accounts WHERE vk_id = ?1",
                params![id.get()],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((vk_id, sex, status, first_seen_at)) => {
                let status = Status::from_db_string(&status).ok_or_else(|| {
                    StorageError::CorruptRecord(format!(
                        "account {} has unknown status '{}'",
                        vk_id, status
                    ))
                })?;
                Ok(Some(AccountRecord {
                    id: AccountId(vk_id),
                    sex: Sex::from_code(sex),
                    status,
                    first_seen_at,
                }))
            }
        }
    }

    // ===== Segments =====

    fn count(&self, segment: Segment) -> StorageResult<u64> {
        let sql = format!(
            "SELECT COUNT(*) FROM accounts WHERE {}",
            segment.sql_filter()
        );
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn export_segment(&self, segment: Segment) -> StorageResult<Vec<AccountId>> {
        let sql = format!(
            "SELECT vk_id FROM accounts WHERE {} ORDER BY id",
            segment.sql_filter()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .map(|id| id.map(AccountId))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

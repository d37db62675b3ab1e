//! Audience statistics
//!
//! This module provides segment counts from the storage layer and a plain
//! text rendering for the command line.

use crate::audience::Segment;
use crate::storage::{AudienceStore, RunRecord, StorageResult};

/// Segment counts of the stored audience
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudienceStatistics {
    pub total: u64,
    pub male: u64,
    pub female: u64,
    pub new: u64,
    pub new_male: u64,
    pub new_female: u64,

    /// Most recent crawl run, if any
    pub latest_run: Option<RunSummary>,
}

/// The parts of a run record worth showing next to the counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: String,
    pub accounts_inserted: u64,
}

impl From<RunRecord> for RunSummary {
    fn from(run: RunRecord) -> Self {
        Self {
            id: run.id,
            started_at: run.started_at,
            finished_at: run.finished_at,
            status: run.status.to_db_string().to_string(),
            accounts_inserted: run.accounts_inserted,
        }
    }
}

impl AudienceStatistics {
    /// Accounts with no declared sex
    pub fn unknown_sex(&self) -> u64 {
        self.total.saturating_sub(self.male + self.female)
    }
}

/// Loads statistics from storage
pub fn load_statistics(store: &dyn AudienceStore) -> StorageResult<AudienceStatistics> {
    Ok(AudienceStatistics {
        total: store.count(Segment::All)?,
        male: store.count(Segment::Male)?,
        female: store.count(Segment::Female)?,
        new: store.count(Segment::New)?,
        new_male: store.count(Segment::NewMale)?,
        new_female: store.count(Segment::NewFemale)?,
        latest_run: store.get_latest_run()?.map(RunSummary::from),
    })
}

/// Formats statistics as plain text
pub fn format_statistics(stats: &AudienceStatistics) -> String {
    let mut out = String::new();

    out.push_str("=== Audience Statistics ===\n\n");
    out.push_str(&format!("  Total accounts: {}\n", stats.total));
    out.push_str(&format!("  Male: {}\n", stats.male));
    out.push_str(&format!("  Female: {}\n", stats.female));
    out.push_str(&format!("  Unknown sex: {}\n", stats.unknown_sex()));
    out.push_str(&format!("  New accounts: {}\n", stats.new));
    out.push_str(&format!("  New male: {}\n", stats.new_male));
    out.push_str(&format!("  New female: {}\n", stats.new_female));

    if let Some(run) = &stats.latest_run {
        out.push_str(&format!(
            "\nLatest run #{} ({}): started {}, finished {}, {} new accounts\n",
            run.id,
            run.status,
            run.started_at,
            run.finished_at.as_deref().unwrap_or("-"),
            run.accounts_inserted
        ));
    }

    out
}

/// Prints statistics to stdout
pub fn print_statistics(stats: &AudienceStatistics) {
    print!("{}", format_statistics(stats));
}

//! Account classification
//!
//! Drops deactivated (deleted or banned) accounts and buckets the rest by
//! declared sex. Duplicates pass through untouched; the store deduplicates.

use crate::audience::{AccountId, Sex};
use crate::crawler::fetcher::RawAccount;

/// Filters and buckets raw API entries
pub fn classify(entries: &[RawAccount]) -> Vec<(AccountId, Sex)> {
    entries
        .iter()
        .filter(|entry| !entry.is_deactivated())
        .map(|entry| (AccountId(entry.id), Sex::from_code(entry.sex.unwrap_or(0))))
        .collect()
}

/// Per-sex tally of classified accounts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SexBreakdown {
    pub male: usize,
    pub female: usize,
    pub unknown: usize,
}

impl SexBreakdown {
    pub fn of(accounts: &[(AccountId, Sex)]) -> Self {
        accounts.iter().fold(Self::default(), |mut acc, (_, sex)| {
            match sex {
                Sex::Male => acc.male += 1,
                Sex::Female => acc.female += 1,
                Sex::Unknown => acc.unknown += 1,
            }
            acc
        })
    }
}

//! Run reports and crawl events
//!
//! A crawl run pushes `CrawlEvent`s to its foreground over a one-way channel
//! and returns a `RunReport` when it finishes.

use crate::audience::CrawlTarget;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

/// Per-target failure taxonomy
///
/// None of these abort a run; they are recorded on the target's report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("API error: {message}")]
    Api { code: Option<i64>, message: String },

    #[error("Transport error: {cause}")]
    Transport { cause: String },

    #[error("No accounts returned")]
    EmptyResult,
}

/// Outcome of crawling a single target
#[derive(Debug, Clone, PartialEq)]
pub struct TargetReport {
    pub target: CrawlTarget,

    /// Raw entries received from the API
    pub fetched: usize,

    /// Entries that survived classification
    pub accepted: usize,

    /// Accounts stored for the first time
    pub inserted: usize,

    pub errors: Vec<TargetError>,
}

impl TargetReport {
    pub fn new(target: CrawlTarget) -> Self {
        Self {
            target,
            fetched: 0,
            accepted: 0,
            inserted: 0,
            errors: Vec::new(),
        }
    }

    /// Flags a target that yielded nothing without any other error
    pub fn finalize(&mut self) {
        if self.accepted == 0 && self.errors.is_empty() {
            self.errors.push(TargetError::EmptyResult);
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Summary of a whole crawl run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub run_id: i64,
    pub total_targets: usize,

    /// Accounts moved from new to old when the run started
    pub aged_out: usize,

    pub targets: Vec<TargetReport>,

    /// True if the run stopped early because it was cancelled
    pub cancelled: bool,
}

impl RunReport {
    pub fn new(run_id: i64, total_targets: usize, aged_out: usize) -> Self {
        Self {
            run_id,
            total_targets,
            aged_out,
            targets: Vec::with_capacity(total_targets),
            cancelled: false,
        }
    }

    pub fn total_fetched(&self) -> usize {
        self.targets.iter().map(|t| t.fetched).sum()
    }

    pub fn total_accepted(&self) -> usize {
        self.targets.iter().map(|t| t.accepted).sum()
    }

    pub fn total_inserted(&self) -> usize {
        self.targets.iter().map(|t| t.inserted).sum()
    }

    /// Targets that reported at least one error
    pub fn failed_targets(&self) -> impl Iterator<Item = &TargetReport> {
        self.targets.iter().filter(|t| !t.is_clean())
    }
}

/// Notification sent from a running crawl to its foreground
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    RunStarted {
        run_id: i64,
        total: usize,
        aged_out: usize,
    },
    TargetStarted(CrawlTarget),
    TargetFailed {
        target: CrawlTarget,
        error: TargetError,
    },
    TargetFinished(TargetReport),
    Progress {
        completed: usize,
        total: usize,
    },
    Done(RunReport),

    /// Terminal event of a run stopped by a storage failure
    Failed {
        run_id: i64,
        error: String,
    },
}

impl CrawlEvent {
    /// Fraction of targets completed, for progress events
    pub fn fraction(&self) -> Option<f64> {
        match self {
            Self::Progress { completed, total } => Some(progress_fraction(*completed, *total)),
            _ => None,
        }
    }
}

/// Fraction of completed targets; an empty run counts as complete
pub fn progress_fraction(completed: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        completed as f64 / total as f64
    }
}

/// Sending half of the event channel
pub type EventSender = UnboundedSender<CrawlEvent>;

/// Cooperative cancellation flag, checked between targets
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that:
//! - Ages out the previous run's `new` accounts
//! - Walks the configured targets one at a time
//! - Routes fetched accounts through classification into the store
//! - Reports progress and per-target failures to the foreground

use crate::audience::CrawlTarget;
use crate::config::Config;
use crate::crawler::classifier::{classify, SexBreakdown};
use crate::crawler::fetcher::{
    ApiFetcher, RawAccount, ACCOUNT_FIELDS, GROUP_MEMBERS, USER_FOLLOWERS, USER_FRIENDS,
};
use crate::crawler::pager::fetch_all;
use crate::crawler::report::{CancelFlag, CrawlEvent, EventSender, RunReport, TargetReport};
use crate::storage::{lock_store, AudienceStore, RunStatus, SharedStore};
use crate::AudienceError;

/// Main crawler coordinator structure
pub struct Coordinator {
    store: SharedStore,
    fetcher: ApiFetcher,
    page_size: u32,
    config_hash: String,
    events: Option<EventSender>,
    cancel: CancelFlag,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `store` - The shared audience store
    /// * `fetcher` - The rate-limited API fetcher
    /// * `page_size` - Items requested per page for paginated methods
    pub fn new(store: SharedStore, fetcher: ApiFetcher, page_size: u32) -> Self {
        Self {
            store,
            fetcher,
            page_size,
            config_hash: String::new(),
            events: None,
            cancel: CancelFlag::new(),
        }
    }

    /// Creates a coordinator from a loaded configuration
    ///
    /// Resolves the access token and builds the HTTP client.
    pub fn from_config(config: &Config, store: SharedStore) -> Result<Self, AudienceError> {
        let token = config.api.resolve_token()?;
        let fetcher = ApiFetcher::new(&config.api, token)?;
        Ok(Self::new(store, fetcher, config.api.page_size))
    }

    /// Attaches a channel that receives progress and log events
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Attaches a cancellation flag checked between targets
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Records the configuration hash on every run this coordinator starts
    pub fn with_config_hash(mut self, config_hash: impl Into<String>) -> Self {
        self.config_hash = config_hash.into();
        self
    }

    /// Runs one crawl over the given targets
    ///
    /// Upstream failures are recorded per target and never stop the run.
    /// Storage failures are fatal: the run is marked failed and the error is
    /// returned.
    pub async fn run(&mut self, targets: &[CrawlTarget]) -> Result<RunReport, AudienceError> {
        let total = targets.len();

        let (run_id, aged_out) = {
            let mut store = lock_store(&self.store)?;
            let aged_out = store.age_out_new()?;
            let run_id = store.begin_run(&self.config_hash, total)?;
            (run_id, aged_out)
        };

        tracing::info!(
            "Starting crawl run {} over {} targets ({} accounts aged out)",
            run_id,
            total,
            aged_out
        );
        self.emit(CrawlEvent::RunStarted {
            run_id,
            total,
            aged_out,
        });

        let mut report = RunReport::new(run_id, total, aged_out);

        if let Err(e) = self.crawl_targets(targets, &mut report).await {
            tracing::error!("Crawl run {} failed: {}", run_id, e);
            if let Ok(mut store) = lock_store(&self.store) {
                if let Err(finish_err) =
                    store.finish_run(run_id, RunStatus::Failed, report.total_inserted() as u64)
                {
                    tracing::error!("Could not mark run {} failed: {}", run_id, finish_err);
                }
            }
            self.emit(CrawlEvent::Failed {
                run_id,
                error: e.to_string(),
            });
            return Err(e);
        }

        let status = if report.cancelled {
            RunStatus::Cancelled
        } else {
            RunStatus::Completed
        };
        lock_store(&self.store)?.finish_run(run_id, status, report.total_inserted() as u64)?;

        tracing::info!(
            "Crawl run {} {}: {} fetched, {} accepted, {} new accounts, {} targets with errors",
            run_id,
            status.to_db_string(),
            report.total_fetched(),
            report.total_accepted(),
            report.total_inserted(),
            report.failed_targets().count()
        );
        self.emit(CrawlEvent::Done(report.clone()));

        Ok(report)
    }

    async fn crawl_targets(
        &mut self,
        targets: &[CrawlTarget],
        report: &mut RunReport,
    ) -> Result<(), AudienceError> {
        let total = targets.len();

        for (index, target) in targets.iter().enumerate() {
            if self.cancel.is_cancelled() {
                tracing::warn!(
                    "Crawl cancelled after {} of {} targets",
                    index,
                    total
                );
                report.cancelled = true;
                break;
            }

            tracing::info!("Harvesting {}", target);
            self.emit(CrawlEvent::TargetStarted(target.clone()));

            let outcome = match target {
                CrawlTarget::Group(group_id) => self.crawl_group(group_id).await?,
                CrawlTarget::User(user_id) => self.crawl_user(user_id).await?,
            };

            for error in &outcome.errors {
                tracing::warn!("{}: {}", target, error);
                self.emit(CrawlEvent::TargetFailed {
                    target: target.clone(),
                    error: error.clone(),
                });
            }

            tracing::info!(
                "Finished {}: {} fetched, {} accepted, {} new",
                target,
                outcome.fetched,
                outcome.accepted,
                outcome.inserted
            );
            self.emit(CrawlEvent::TargetFinished(outcome.clone()));
            report.targets.push(outcome);

            self.emit(CrawlEvent::Progress {
                completed: index + 1,
                total,
            });
        }

        Ok(())
    }

    /// Harvests all members of a group
    async fn crawl_group(&mut self, group_id: &str) -> Result<TargetReport, AudienceError> {
        let mut outcome = TargetReport::new(CrawlTarget::Group(group_id.to_string()));

        let params = [
            ("group_id", group_id.to_string()),
            ("fields", ACCOUNT_FIELDS.to_string()),
        ];
        let paged = fetch_all(&mut self.fetcher, GROUP_MEMBERS, &params, self.page_size).await;

        self.absorb(&mut outcome, &paged.items)?;
        if let Some(failure) = paged.failure {
            outcome.errors.push(failure);
        }

        outcome.finalize();
        Ok(outcome)
    }

    /// Harvests a user's friends, then followers
    ///
    /// A failed friends call does not prevent the followers fetch.
    async fn crawl_user(&mut self, user_id: &str) -> Result<TargetReport, AudienceError> {
        let mut outcome = TargetReport::new(CrawlTarget::User(user_id.to_string()));

        let params = [
            ("user_id", user_id.to_string()),
            ("fields", ACCOUNT_FIELDS.to_string()),
        ];

        match self.fetcher.fetch(USER_FRIENDS, &params).await.into_result() {
            Ok(friends) => self.absorb(&mut outcome, &friends)?,
            Err(e) => {
                tracing::warn!("Friends of user {} unavailable: {}", user_id, e);
                outcome.errors.push(e);
            }
        }

        let paged = fetch_all(&mut self.fetcher, USER_FOLLOWERS, &params, self.page_size).await;
        self.absorb(&mut outcome, &paged.items)?;
        if let Some(failure) = paged.failure {
            outcome.errors.push(failure);
        }

        outcome.finalize();
        Ok(outcome)
    }

    /// Classifies a batch and stores it as one transaction
    fn absorb(
        &self,
        outcome: &mut TargetReport,
        entries: &[RawAccount],
    ) -> Result<(), AudienceError> {
        let accepted = classify(entries);
        let breakdown = SexBreakdown::of(&accepted);
        tracing::debug!(
            "{}: {} of {} entries accepted ({} male, {} female, {} unknown)",
            outcome.target,
            accepted.len(),
            entries.len(),
            breakdown.male,
            breakdown.female,
            breakdown.unknown
        );

        let inserted = lock_store(&self.store)?.upsert_new(&accepted)?;

        outcome.fetched += entries.len();
        outcome.accepted += accepted.len();
        outcome.inserted += inserted;
        Ok(())
    }

    fn emit(&self, event: CrawlEvent) {
        if let Some(events) = &self.events {
            // A foreground that stopped listening must not stop the crawl
            let _ = events.send(event);
        }
    }
}

/// Runs a crawl over every target in the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use vk_audience::config::load_config;
/// use vk_audience::crawler::run_crawl;
/// use vk_audience::storage::open_shared;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let store = open_shared(Path::new(&config.output.database_path))?;
/// let report = run_crawl(&config, store).await?;
/// println!("{} new accounts", report.total_inserted());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config, store: SharedStore) -> Result<RunReport, AudienceError> {
    let targets = CrawlTarget::from_lists(&config.targets.groups, &config.targets.users);
    let mut coordinator = Coordinator::from_config(config, store)?;
    coordinator.run(&targets).await
}

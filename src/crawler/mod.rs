//! Crawler module for harvesting accounts from the VK API
//!
//! This module contains the core crawling logic, including:
//! - Rate-limited API calls with response classification
//! - Offset pagination terminated by a short page
//! - Filtering and sex bucketing of accounts
//! - Overall crawl coordination and progress reporting

mod classifier;
mod coordinator;
mod fetcher;
mod pager;
mod report;
mod throttle;

pub use classifier::{classify, SexBreakdown};
pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{
    build_http_client, parse_page, ApiFetcher, PageResult, RawAccount, ACCOUNT_FIELDS,
    GROUP_MEMBERS, USER_FOLLOWERS, USER_FRIENDS,
};
pub use pager::{fetch_all, Paged};
pub use report::{
    progress_fraction, CancelFlag, CrawlEvent, EventSender, RunReport, TargetError, TargetReport,
};
pub use throttle::Throttle;

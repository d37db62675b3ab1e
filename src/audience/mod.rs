//! Audience data model
//!
//! This module defines the records the harvester persists and the
//! vocabulary used to talk about them.
//!
//! # Components
//!
//! - `AccountId`, `Sex`, `Status`: the stored account record
//! - `Segment`: named export filters over stored accounts
//! - `CrawlTarget`: a group or user whose audience is harvested

mod account;
mod segment;
mod target;

// Re-export main types
pub use account::{AccountId, AccountRecord, Sex, Status};
pub use segment::{ParseSegmentError, Segment};
pub use target::CrawlTarget;

//! VK Audience: a polite audience harvester
//!
//! This crate collects member, friend and follower identifiers from the VK
//! API, classifies them by declared sex, deduplicates them in SQLite and
//! exports advertising audience lists as CSV.

pub mod audience;
pub mod config;
pub mod crawler;
pub mod output;
pub mod storage;

use thiserror::Error;

/// Main error type for VK Audience operations
#[derive(Debug, Error)]
pub enum AudienceError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Audience store lock poisoned")]
    LockPoisoned,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing access token: set api.access-token or {0}")]
    MissingToken(&'static str),
}

/// Result type alias for VK Audience operations
pub type Result<T> = std::result::Result<T, AudienceError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use audience::{AccountId, AccountRecord, CrawlTarget, Segment, Sex, Status};
pub use config::Config;
pub use crawler::{CancelFlag, Coordinator, CrawlEvent, RunReport, TargetError};
pub use storage::{AudienceStore, SqliteStore};

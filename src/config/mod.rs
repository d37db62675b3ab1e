//! Configuration module for VK Audience
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use vk_audience::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Groups to harvest: {}", config.targets.groups.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ApiConfig, Config, OutputConfig, TargetsConfig, ACCESS_TOKEN_ENV};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};

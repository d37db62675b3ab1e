use crate::config::types::{ApiConfig, Config, OutputConfig, TargetsConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Largest page the paginated VK methods will return
const MAX_PAGE_SIZE: u32 = 1000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_output_config(&config.output)?;
    validate_targets(&config.targets)?;
    Ok(())
}

/// Validates API access configuration
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "version cannot be empty".to_string(),
        ));
    }

    if config.page_size < 1 || config.page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::Validation(format!(
            "page-size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, config.page_size
        )));
    }

    if config.request_delay < 50 || config.request_delay > 60_000 {
        return Err(ConfigError::Validation(format!(
            "request-delay must be between 50ms and 60000ms, got {}ms",
            config.request_delay
        )));
    }

    if config.timeout < 1 || config.timeout > 300 {
        return Err(ConfigError::Validation(format!(
            "timeout must be between 1 and 300 seconds, got {}",
            config.timeout
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if config.export_dir.is_empty() {
        return Err(ConfigError::Validation(
            "export-dir cannot be empty".to_string(),
        ));
    }

    if config.min_export_size < 1 {
        return Err(ConfigError::Validation(
            "min-export-size must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the group and user target lists
fn validate_targets(config: &TargetsConfig) -> Result<(), ConfigError> {
    validate_id_list("groups", &config.groups)?;
    validate_id_list("users", &config.users)?;
    Ok(())
}

fn validate_id_list(list: &str, ids: &[String]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for id in ids {
        validate_target_id(list, id)?;

        if !seen.insert(id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate entry '{}' in targets.{}",
                id, list
            )));
        }
    }

    Ok(())
}

/// Validates a single group or user id (numeric id or screen name)
fn validate_target_id(list: &str, id: &str) -> Result<(), ConfigError> {
    if id.is_empty() {
        return Err(ConfigError::Validation(format!(
            "targets.{} cannot contain empty ids",
            list
        )));
    }

    if id.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "Id '{}' in targets.{} cannot contain whitespace",
            id, list
        )));
    }

    Ok(())
}

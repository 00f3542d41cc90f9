//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("history.queue_capacity must be greater than zero")]
    ZeroQueueCapacity,
    #[error("history.batch_size must be greater than zero")]
    ZeroBatchSize,
    #[error("history.query_timeout_ms must be greater than zero")]
    ZeroQueryTimeout,
    #[error("engine.event_queue must be greater than zero")]
    ZeroEventQueue,
    #[error("network.name is required")]
    MissingNetworkName,
    #[error("network '{0}' is configured more than once")]
    DuplicateNetwork(String),
    #[error("network '{0}' has an empty nickname")]
    MissingNickname(String),
    #[error("database.path parent directory does not exist: {0}")]
    DatabasePathInvalid(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.history.queue_capacity == 0 {
        errors.push(ValidationError::ZeroQueueCapacity);
    }
    if config.history.batch_size == 0 {
        errors.push(ValidationError::ZeroBatchSize);
    }
    if config.history.query_timeout_ms == 0 {
        errors.push(ValidationError::ZeroQueryTimeout);
    }
    if config.engine.event_queue == 0 {
        errors.push(ValidationError::ZeroEventQueue);
    }

    let mut seen = HashSet::new();
    for network in &config.networks {
        if network.name.trim().is_empty() {
            errors.push(ValidationError::MissingNetworkName);
            continue;
        }
        if !seen.insert(network.name.to_ascii_lowercase()) {
            errors.push(ValidationError::DuplicateNetwork(network.name.clone()));
        }
        if network.nickname.trim().is_empty() {
            errors.push(ValidationError::MissingNickname(network.name.clone()));
        }
    }

    if config.database.path != ":memory:" {
        let db_path = Path::new(&config.database.path);
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            errors.push(ValidationError::DatabasePathInvalid(
                config.database.path.clone(),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
